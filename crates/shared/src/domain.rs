use std::{fmt, str::FromStr};

use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use uuid::Uuid;

pub const ITEM_LIST_URL: &str = "/item";
pub const CATEGORY_LIST_URL: &str = "/category";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_newtype!(CategoryId);
id_newtype!(ItemId);

impl CategoryId {
    pub fn url(&self) -> String {
        format!("{CATEGORY_LIST_URL}/{self}")
    }
}

impl ItemId {
    pub fn url(&self) -> String {
        format!("{ITEM_LIST_URL}/{self}")
    }
}

/// Records that have a detail page serialize a derived `url` next to their
/// fields, so pages link through the same paths the workflows redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub description: String,
}

impl Category {
    pub fn url(&self) -> String {
        self.id.url()
    }
}

/// Fields written by item create and update. `price` is kept exactly as
/// accepted by the form layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: String,
    pub number_in_stock: i64,
    pub categories: Vec<CategoryId>,
}

/// Projection used by the item list page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub price: String,
    pub number_in_stock: i64,
}

impl ItemSummary {
    pub fn url(&self) -> String {
        self.id.url()
    }
}

/// Projection used wherever only an item's name is shown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemName {
    pub id: ItemId,
    pub name: String,
}

impl ItemName {
    pub fn url(&self) -> String {
        self.id.url()
    }
}

/// An item with its category references resolved. References to categories
/// that no longer exist are not included.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemDetail {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub number_in_stock: i64,
    pub categories: Vec<Category>,
}

impl ItemDetail {
    pub fn url(&self) -> String {
        self.id.url()
    }

    pub fn references(&self, category_id: CategoryId) -> bool {
        self.categories.iter().any(|c| c.id == category_id)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Category", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("url", &self.url())?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("description", &self.description)?;
        state.end()
    }
}

impl Serialize for ItemSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ItemSummary", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("url", &self.url())?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("number_in_stock", &self.number_in_stock)?;
        state.end()
    }
}

impl Serialize for ItemName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ItemName", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("url", &self.url())?;
        state.serialize_field("name", &self.name)?;
        state.end()
    }
}

impl Serialize for ItemDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ItemDetail", 7)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("url", &self.url())?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("price", &self.price)?;
        state.serialize_field("number_in_stock", &self.number_in_stock)?;
        state.serialize_field("categories", &self.categories)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub items: i64,
    pub categories: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_urls_are_built_from_ids() {
        let id: ItemId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().expect("id");
        assert_eq!(id.url(), "/item/67e55044-10b1-426f-9247-bb680e5fe0c8");

        let category = Category {
            id: "1b4e28ba-2fa1-11d2-883f-0016d3cca427".parse().expect("id"),
            title: "Guitar".into(),
            description: "strings".into(),
        };
        assert_eq!(category.url(), "/category/1b4e28ba-2fa1-11d2-883f-0016d3cca427");
    }

    #[test]
    fn records_serialize_their_detail_url() {
        let item = ItemName {
            id: "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().expect("id"),
            name: "Fender Jazz Bass".into(),
        };
        let json = serde_json::to_value(&item).expect("json");
        assert_eq!(json["url"], "/item/67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(json["id"], "67e55044-10b1-426f-9247-bb680e5fe0c8");

        let detail = ItemDetail {
            id: item.id,
            name: item.name.clone(),
            description: "bass".into(),
            price: "849.99".into(),
            number_in_stock: 13,
            categories: vec![Category {
                id: "1b4e28ba-2fa1-11d2-883f-0016d3cca427".parse().expect("id"),
                title: "Bass".into(),
                description: "low end".into(),
            }],
        };
        let json = serde_json::to_value(&detail).expect("json");
        assert_eq!(json["url"], "/item/67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(
            json["categories"][0]["url"],
            "/category/1b4e28ba-2fa1-11d2-883f-0016d3cca427"
        );
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = CategoryId::generate();
        let json = serde_json::to_string(&id).expect("json");
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn rejects_non_uuid_ids() {
        assert!("not-an-id".parse::<CategoryId>().is_err());
    }
}
