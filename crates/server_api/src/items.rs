use shared::{
    domain::{Category, CategoryId, ItemId, NewItem, ITEM_LIST_URL},
    error::ApiError,
    protocol::{
        CategoryChoice, ConfirmOutcome, FieldError, FormOutcome, ItemDeleteView, ItemDetailView,
        ItemFormValues, ItemFormView, ItemListView,
    },
};
use tracing::{debug, info, warn};

use crate::{
    internal,
    validation::{
        FormData, FormValidator, GateSecret, DESCRIPTION_REQUIRED, NAME_REQUIRED,
        PASSWORD_INCORRECT, PRICE_INVALID, STOCK_INVALID, STOCK_RANGE,
    },
    ApiContext,
};

const CREATE_TITLE: &str = "Create Item";
const UPDATE_TITLE: &str = "Update Item";
const DELETE_TITLE: &str = "Delete Item";

pub async fn list_items(ctx: &ApiContext) -> Result<ItemListView, ApiError> {
    let items = ctx.storage.list_items().await.map_err(internal)?;
    Ok(ItemListView {
        title: "Music Store Items".to_string(),
        items,
    })
}

/// A missing item is handed to the view as `None`; there is no 404 here.
pub async fn get_item_detail(ctx: &ApiContext, item_id: ItemId) -> Result<ItemDetailView, ApiError> {
    let item = ctx.storage.get_item(item_id).await.map_err(internal)?;
    Ok(ItemDetailView {
        title: "Instrument Detail".to_string(),
        item,
    })
}

pub async fn render_create_form(ctx: &ApiContext) -> Result<ItemFormView, ApiError> {
    let categories = ctx.storage.list_categories().await.map_err(internal)?;
    Ok(ItemFormView {
        title: CREATE_TITLE.to_string(),
        item: None,
        categories: mark_checked(categories, &[]),
        errors: Vec::new(),
    })
}

pub async fn create_item(
    ctx: &ApiContext,
    form: &FormData,
) -> Result<FormOutcome<ItemFormView>, ApiError> {
    let submission = ItemSubmission::validate(form, &ctx.secret);
    let Some(new_item) = submission.accepted() else {
        debug!(errors = submission.errors.len(), "item create form rejected");
        return rerender_form(ctx, CREATE_TITLE, submission).await;
    };

    let item_id = ctx.storage.create_item(&new_item).await.map_err(internal)?;
    info!(%item_id, name = %new_item.name, "item created");
    Ok(FormOutcome::Redirect(item_id.url()))
}

pub async fn render_update_form(
    ctx: &ApiContext,
    item_id: ItemId,
) -> Result<ItemFormView, ApiError> {
    let (item, categories) = futures::try_join!(
        ctx.storage.get_item(item_id),
        ctx.storage.list_categories()
    )
    .map_err(internal)?;
    let item = item.ok_or_else(|| ApiError::not_found("Item not found"))?;

    let selected: Vec<String> = item.categories.iter().map(|c| c.id.to_string()).collect();
    Ok(ItemFormView {
        title: UPDATE_TITLE.to_string(),
        item: Some(ItemFormValues::from(&item)),
        categories: mark_checked(categories, &selected),
        errors: Vec::new(),
    })
}

pub async fn update_item(
    ctx: &ApiContext,
    item_id: ItemId,
    form: &FormData,
) -> Result<FormOutcome<ItemFormView>, ApiError> {
    let mut submission = ItemSubmission::validate(form, &ctx.secret);
    submission.values.id = Some(item_id.to_string());
    let Some(new_item) = submission.accepted() else {
        debug!(%item_id, errors = submission.errors.len(), "item update form rejected");
        return rerender_form(ctx, UPDATE_TITLE, submission).await;
    };

    if !ctx
        .storage
        .update_item(item_id, &new_item)
        .await
        .map_err(internal)?
    {
        warn!(%item_id, "update target vanished");
        return Err(ApiError::not_found("Item not found"));
    }
    info!(%item_id, "item updated");
    Ok(FormOutcome::Redirect(item_id.url()))
}

pub async fn render_delete_confirm(
    ctx: &ApiContext,
    item_id: ItemId,
) -> Result<ConfirmOutcome<ItemDeleteView>, ApiError> {
    let Some(item) = ctx.storage.get_item(item_id).await.map_err(internal)? else {
        return Ok(ConfirmOutcome::Redirect(ITEM_LIST_URL.to_string()));
    };
    Ok(ConfirmOutcome::Render(ItemDeleteView {
        title: DELETE_TITLE.to_string(),
        item: Some(item),
        errors: Vec::new(),
    }))
}

pub async fn delete_item(
    ctx: &ApiContext,
    item_id: ItemId,
    form: &FormData,
) -> Result<FormOutcome<ItemDeleteView>, ApiError> {
    let mut validator = FormValidator::new(form);
    validator.gated("password", &ctx.secret, PASSWORD_INCORRECT);
    let errors = validator.finish();

    if !errors.is_empty() {
        let item = ctx.storage.get_item(item_id).await.map_err(internal)?;
        return Ok(FormOutcome::Render(ItemDeleteView {
            title: DELETE_TITLE.to_string(),
            item,
            errors,
        }));
    }

    ctx.storage.delete_item(item_id).await.map_err(internal)?;
    info!(%item_id, "item deleted");
    Ok(FormOutcome::Redirect(ITEM_LIST_URL.to_string()))
}

struct ItemSubmission {
    values: ItemFormValues,
    number_in_stock: Option<i64>,
    errors: Vec<FieldError>,
}

impl ItemSubmission {
    fn validate(form: &FormData, secret: &GateSecret) -> Self {
        let mut validator = FormValidator::new(form);
        let name = validator.required_text("name", NAME_REQUIRED);
        let description = validator.required_text("description", DESCRIPTION_REQUIRED);
        let categories = validator.escaped_list("category");
        let price = validator.currency("price", PRICE_INVALID);
        let stock = validator.bounded_int("number_in_stock", STOCK_RANGE, STOCK_INVALID);
        validator.gated("password", secret, PASSWORD_INCORRECT);

        Self {
            values: ItemFormValues {
                id: None,
                name,
                description,
                price,
                number_in_stock: stock.echo,
                categories,
            },
            number_in_stock: stock.value,
            errors: validator.finish(),
        }
    }

    /// The record to persist, or `None` while any rule failed. Submitted
    /// category values that are not ids are dropped.
    fn accepted(&self) -> Option<NewItem> {
        if !self.errors.is_empty() {
            return None;
        }
        let number_in_stock = self.number_in_stock?;
        let categories = self
            .values
            .categories
            .iter()
            .filter_map(|raw| match raw.parse::<CategoryId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    debug!(value = %raw, "ignoring category value that is not an id");
                    None
                }
            })
            .collect();
        Some(NewItem {
            name: self.values.name.clone(),
            description: self.values.description.clone(),
            price: self.values.price.clone(),
            number_in_stock,
            categories,
        })
    }
}

async fn rerender_form(
    ctx: &ApiContext,
    title: &str,
    submission: ItemSubmission,
) -> Result<FormOutcome<ItemFormView>, ApiError> {
    let categories = ctx.storage.list_categories().await.map_err(internal)?;
    let categories = mark_checked(categories, &submission.values.categories);
    Ok(FormOutcome::Render(ItemFormView {
        title: title.to_string(),
        item: Some(submission.values),
        categories,
        errors: submission.errors,
    }))
}

fn mark_checked(categories: Vec<Category>, selected: &[String]) -> Vec<CategoryChoice> {
    categories
        .into_iter()
        .map(|category| {
            let id = category.id.to_string();
            let checked = selected.iter().any(|s| *s == id);
            CategoryChoice { category, checked }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/items_tests.rs"]
mod tests;
