use serde::{Deserialize, Serialize};

use crate::domain::{Category, CatalogCounts, CategoryId, ItemDetail, ItemName, ItemSummary};

/// One failed validation rule, in the order the rules ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of a form submission: either the write happened and the client is
/// sent elsewhere, or the form is shown again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FormOutcome<V> {
    Redirect(String),
    Render(V),
}

impl<V> FormOutcome<V> {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect(url) => Some(url),
            Self::Render(_) => None,
        }
    }

    pub fn into_view(self) -> Option<V> {
        match self {
            Self::Redirect(_) => None,
            Self::Render(view) => Some(view),
        }
    }
}

/// Result of showing a delete confirmation page.
pub type ConfirmOutcome<V> = FormOutcome<V>;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummaryView {
    pub title: String,
    pub counts: CatalogCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemListView {
    pub title: String,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetailView {
    pub title: String,
    pub item: Option<ItemDetail>,
}

/// Values echoed back into the item form, already trimmed and escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemFormValues {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub price: String,
    pub number_in_stock: String,
    pub categories: Vec<String>,
}

impl From<&ItemDetail> for ItemFormValues {
    fn from(item: &ItemDetail) -> Self {
        Self {
            id: Some(item.id.to_string()),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price.clone(),
            number_in_stock: item.number_in_stock.to_string(),
            categories: item.categories.iter().map(|c| c.id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChoice {
    pub category: Category,
    pub checked: bool,
}

impl CategoryChoice {
    pub fn id(&self) -> CategoryId {
        self.category.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemFormView {
    pub title: String,
    pub item: Option<ItemFormValues>,
    pub categories: Vec<CategoryChoice>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDeleteView {
    pub title: String,
    pub item: Option<ItemDetail>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListView {
    pub title: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetailView {
    pub title: String,
    pub category: Option<Category>,
    pub items: Vec<ItemName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFormValues {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
}

impl From<&Category> for CategoryFormValues {
    fn from(category: &Category) -> Self {
        Self {
            id: Some(category.id.to_string()),
            title: category.title.clone(),
            description: category.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryFormView {
    pub title: String,
    pub category: Option<CategoryFormValues>,
    pub errors: Vec<FieldError>,
}

/// Delete confirmation for a category. A non-empty `items` list means the
/// delete is blocked.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDeleteView {
    pub title: String,
    pub category: Option<Category>,
    pub items: Vec<ItemName>,
    pub errors: Vec<FieldError>,
}

impl CategoryDeleteView {
    pub fn is_blocked(&self) -> bool {
        !self.items.is_empty()
    }
}
