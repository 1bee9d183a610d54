use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{
    CatalogCounts, Category, CategoryId, ItemDetail, ItemId, ItemName, ItemSummary, NewItem,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!(%database_url, "catalog store ready");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn counts(&self) -> Result<CatalogCounts> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM items), (SELECT COUNT(*) FROM categories)",
        )
        .fetch_one(&self.pool)
        .await
        .context("failed to count catalog records")?;
        Ok(CatalogCounts {
            items: row.get::<i64, _>(0),
            categories: row.get::<i64, _>(1),
        })
    }

    pub async fn create_category(&self, title: &str, description: &str) -> Result<CategoryId> {
        let category_id = CategoryId::generate();
        sqlx::query("INSERT INTO categories (id, title, description) VALUES (?, ?, ?)")
            .bind(category_id.to_string())
            .bind(title)
            .bind(description)
            .execute(&self.pool)
            .await
            .context("failed to insert category")?;
        Ok(category_id)
    }

    pub async fn get_category(&self, category_id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, title, description FROM categories WHERE id = ?")
            .bind(category_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| category_from_row(&r)).transpose()
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, title, description FROM categories ORDER BY title ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    pub async fn update_category(
        &self,
        category_id: CategoryId,
        title: &str,
        description: &str,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET title = ?, description = ? WHERE id = ?")
            .bind(title)
            .bind(description)
            .bind(category_id.to_string())
            .execute(&self.pool)
            .await
            .context("failed to update category")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_category(&self, category_id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(category_id.to_string())
            .execute(&self.pool)
            .await
            .context("failed to delete category")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_items_in_category(&self, category_id: CategoryId) -> Result<Vec<ItemName>> {
        let rows = sqlx::query(
            "SELECT i.id, i.name
             FROM items i
             INNER JOIN item_categories ic ON ic.item_id = i.id
             WHERE ic.category_id = ?
             ORDER BY i.name ASC",
        )
        .bind(category_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                Ok(ItemName {
                    id: parse_id(r, 0)?,
                    name: r.get::<String, _>(1),
                })
            })
            .collect()
    }

    pub async fn create_item(&self, item: &NewItem) -> Result<ItemId> {
        let item_id = ItemId::generate();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO items (id, name, description, price, number_in_stock) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(item_id.to_string())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.price)
        .bind(item.number_in_stock)
        .execute(&mut *tx)
        .await
        .context("failed to insert item")?;
        insert_item_links(&mut tx, item_id, &item.categories).await?;
        tx.commit().await?;
        Ok(item_id)
    }

    pub async fn get_item(&self, item_id: ItemId) -> Result<Option<ItemDetail>> {
        let Some(row) = sqlx::query(
            "SELECT id, name, description, price, number_in_stock FROM items WHERE id = ?",
        )
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let category_rows = sqlx::query(
            "SELECT c.id, c.title, c.description
             FROM item_categories ic
             INNER JOIN categories c ON c.id = ic.category_id
             WHERE ic.item_id = ?
             ORDER BY c.title ASC",
        )
        .bind(item_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        let categories = category_rows
            .iter()
            .map(category_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ItemDetail {
            id: parse_id(&row, 0)?,
            name: row.get::<String, _>(1),
            description: row.get::<String, _>(2),
            price: row.get::<String, _>(3),
            number_in_stock: row.get::<i64, _>(4),
            categories,
        }))
    }

    pub async fn list_items(&self) -> Result<Vec<ItemSummary>> {
        let rows = sqlx::query("SELECT id, name, price, number_in_stock FROM items ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| {
                Ok(ItemSummary {
                    id: parse_id(r, 0)?,
                    name: r.get::<String, _>(1),
                    price: r.get::<String, _>(2),
                    number_in_stock: r.get::<i64, _>(3),
                })
            })
            .collect()
    }

    /// Replaces every field of the item, including its category links.
    /// Returns `false` when no item has this id.
    pub async fn update_item(&self, item_id: ItemId, item: &NewItem) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE items SET name = ?, description = ?, price = ?, number_in_stock = ? WHERE id = ?",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.price)
        .bind(item.number_in_stock)
        .bind(item_id.to_string())
        .execute(&mut *tx)
        .await
        .context("failed to update item")?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM item_categories WHERE item_id = ?")
            .bind(item_id.to_string())
            .execute(&mut *tx)
            .await?;
        insert_item_links(&mut tx, item_id, &item.categories).await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_item(&self, item_id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item_id.to_string())
            .execute(&self.pool)
            .await
            .context("failed to delete item")?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_item_links(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: ItemId,
    categories: &[CategoryId],
) -> Result<()> {
    for category_id in categories {
        sqlx::query("INSERT OR IGNORE INTO item_categories (item_id, category_id) VALUES (?, ?)")
            .bind(item_id.to_string())
            .bind(category_id.to_string())
            .execute(&mut **tx)
            .await
            .context("failed to link item to category")?;
    }
    Ok(())
}

fn category_from_row(row: &SqliteRow) -> Result<Category> {
    Ok(Category {
        id: parse_id(row, 0)?,
        title: row.get::<String, _>(1),
        description: row.get::<String, _>(2),
    })
}

fn parse_id<T>(row: &SqliteRow, index: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = row.get::<String, _>(index);
    raw.parse::<T>()
        .with_context(|| format!("stored id '{raw}' is not a valid uuid"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
