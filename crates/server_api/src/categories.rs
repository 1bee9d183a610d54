use shared::{
    domain::{CategoryId, CATEGORY_LIST_URL},
    error::ApiError,
    protocol::{
        CategoryDeleteView, CategoryDetailView, CategoryFormValues, CategoryFormView,
        CategoryListView, ConfirmOutcome, FormOutcome,
    },
};
use tracing::{debug, info, warn};

use crate::{
    internal,
    validation::{
        FormData, FormValidator, DESCRIPTION_REQUIRED, PASSWORD_INCORRECT, TITLE_REQUIRED,
    },
    ApiContext,
};

const CREATE_TITLE: &str = "Create Category";
const UPDATE_TITLE: &str = "Update Category";
const DELETE_TITLE: &str = "Delete Category";

pub async fn list_categories(ctx: &ApiContext) -> Result<CategoryListView, ApiError> {
    let categories = ctx.storage.list_categories().await.map_err(internal)?;
    Ok(CategoryListView {
        title: "Music Store Categories".to_string(),
        categories,
    })
}

pub async fn get_category_detail(
    ctx: &ApiContext,
    category_id: CategoryId,
) -> Result<CategoryDetailView, ApiError> {
    let (category, items) = futures::try_join!(
        ctx.storage.get_category(category_id),
        ctx.storage.list_items_in_category(category_id)
    )
    .map_err(internal)?;
    Ok(CategoryDetailView {
        title: "Category Detail".to_string(),
        category,
        items,
    })
}

pub fn render_create_form() -> CategoryFormView {
    CategoryFormView {
        title: CREATE_TITLE.to_string(),
        category: None,
        errors: Vec::new(),
    }
}

/// The create path carries a password field but never compares it with the
/// secret, unlike update and delete.
pub async fn create_category(
    ctx: &ApiContext,
    form: &FormData,
) -> Result<FormOutcome<CategoryFormView>, ApiError> {
    let mut validator = FormValidator::new(form);
    let values = CategoryFormValues {
        id: None,
        title: validator.required_text("title", TITLE_REQUIRED),
        description: validator.required_text("description", DESCRIPTION_REQUIRED),
    };
    let errors = validator.finish();

    if !errors.is_empty() {
        debug!(errors = errors.len(), "category create form rejected");
        return Ok(FormOutcome::Render(CategoryFormView {
            title: CREATE_TITLE.to_string(),
            category: Some(values),
            errors,
        }));
    }

    let category_id = ctx
        .storage
        .create_category(&values.title, &values.description)
        .await
        .map_err(internal)?;
    info!(%category_id, title = %values.title, "category created");
    Ok(FormOutcome::Redirect(category_id.url()))
}

pub async fn render_update_form(
    ctx: &ApiContext,
    category_id: CategoryId,
) -> Result<CategoryFormView, ApiError> {
    let category = ctx
        .storage
        .get_category(category_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(CategoryFormView {
        title: UPDATE_TITLE.to_string(),
        category: Some(CategoryFormValues::from(&category)),
        errors: Vec::new(),
    })
}

pub async fn update_category(
    ctx: &ApiContext,
    category_id: CategoryId,
    form: &FormData,
) -> Result<FormOutcome<CategoryFormView>, ApiError> {
    let mut validator = FormValidator::new(form);
    let values = CategoryFormValues {
        id: Some(category_id.to_string()),
        title: validator.required_text("title", TITLE_REQUIRED),
        description: validator.required_text("description", DESCRIPTION_REQUIRED),
    };
    validator.gated("password", &ctx.secret, PASSWORD_INCORRECT);
    let errors = validator.finish();

    if !errors.is_empty() {
        debug!(%category_id, errors = errors.len(), "category update form rejected");
        return Ok(FormOutcome::Render(CategoryFormView {
            title: UPDATE_TITLE.to_string(),
            category: Some(values),
            errors,
        }));
    }

    if !ctx
        .storage
        .update_category(category_id, &values.title, &values.description)
        .await
        .map_err(internal)?
    {
        warn!(%category_id, "update target vanished");
        return Err(ApiError::not_found("Category not found"));
    }
    info!(%category_id, "category updated");
    Ok(FormOutcome::Redirect(category_id.url()))
}

pub async fn render_delete_confirm(
    ctx: &ApiContext,
    category_id: CategoryId,
) -> Result<ConfirmOutcome<CategoryDeleteView>, ApiError> {
    let (category, items) = futures::try_join!(
        ctx.storage.get_category(category_id),
        ctx.storage.list_items_in_category(category_id)
    )
    .map_err(internal)?;
    let Some(category) = category else {
        return Ok(ConfirmOutcome::Redirect(CATEGORY_LIST_URL.to_string()));
    };
    Ok(ConfirmOutcome::Render(CategoryDeleteView {
        title: DELETE_TITLE.to_string(),
        category: Some(category),
        items,
        errors: Vec::new(),
    }))
}

/// Refuses while any item still references the category; the password is
/// only looked at once nothing does.
pub async fn delete_category(
    ctx: &ApiContext,
    category_id: CategoryId,
    form: &FormData,
) -> Result<FormOutcome<CategoryDeleteView>, ApiError> {
    let (category, items) = futures::try_join!(
        ctx.storage.get_category(category_id),
        ctx.storage.list_items_in_category(category_id)
    )
    .map_err(internal)?;

    if !items.is_empty() {
        warn!(%category_id, referencing = items.len(), "category delete refused");
        return Ok(FormOutcome::Render(CategoryDeleteView {
            title: DELETE_TITLE.to_string(),
            category,
            items,
            errors: Vec::new(),
        }));
    }

    let mut validator = FormValidator::new(form);
    validator.gated("password", &ctx.secret, PASSWORD_INCORRECT);
    let errors = validator.finish();
    if !errors.is_empty() {
        return Ok(FormOutcome::Render(CategoryDeleteView {
            title: DELETE_TITLE.to_string(),
            category,
            items,
            errors,
        }));
    }

    ctx.storage
        .delete_category(category_id)
        .await
        .map_err(internal)?;
    info!(%category_id, "category deleted");
    Ok(FormOutcome::Redirect(CATEGORY_LIST_URL.to_string()))
}

#[cfg(test)]
#[path = "tests/categories_tests.rs"]
mod tests;
