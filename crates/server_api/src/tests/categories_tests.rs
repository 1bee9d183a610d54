use super::*;
use crate::tests::{setup, SECRET};
use shared::{domain::NewItem, error::ErrorCode, protocol::FieldError};

fn category_form(title: &str, description: &str, password: &str) -> FormData {
    FormData::from_pairs([
        ("title", title),
        ("description", description),
        ("password", password),
    ])
}

fn password(value: &str) -> FormData {
    FormData::from_pairs([("password", value)])
}

async fn stock_item(ctx: &ApiContext, name: &str, category: CategoryId) {
    ctx.storage
        .create_item(&NewItem {
            name: name.to_string(),
            description: "d".to_string(),
            price: "100.00".to_string(),
            number_in_stock: 1,
            categories: vec![category],
        })
        .await
        .expect("item");
}

#[tokio::test]
async fn create_accepts_wrong_password() {
    let ctx = setup().await;
    let outcome = create_category(&ctx, &category_form("Amps", "d", "wrong"))
        .await
        .expect("create");
    let url = outcome.redirect_target().expect("redirect");
    let category_id: CategoryId = url
        .strip_prefix("/category/")
        .expect("category url")
        .parse()
        .expect("id");

    let stored = ctx
        .storage
        .get_category(category_id)
        .await
        .expect("get")
        .expect("category");
    assert_eq!(stored.title, "Amps");
}

#[tokio::test]
async fn create_accepts_missing_password() {
    let ctx = setup().await;
    let form = FormData::from_pairs([("title", "Amps"), ("description", "d")]);
    let outcome = create_category(&ctx, &form).await.expect("create");
    assert!(outcome.redirect_target().is_some());
}

#[tokio::test]
async fn create_rejects_blank_title_and_echoes_escaped_values() {
    let ctx = setup().await;
    let view = create_category(&ctx, &category_form("  ", " <b>loud</b> ", SECRET))
        .await
        .expect("create")
        .into_view()
        .expect("rerender");
    assert_eq!(view.title, "Create Category");
    assert_eq!(view.errors, vec![FieldError::new("title", TITLE_REQUIRED)]);
    let echoed = view.category.expect("echo");
    assert_eq!(echoed.title, "");
    assert_eq!(echoed.description, "&lt;b&gt;loud&lt;&#x2F;b&gt;");
    assert!(ctx.storage.list_categories().await.expect("list").is_empty());
}

#[tokio::test]
async fn list_is_sorted_by_title() {
    let ctx = setup().await;
    for title in ["Piano", "Drums", "Guitar"] {
        ctx.storage.create_category(title, "d").await.expect("create");
    }
    let titles: Vec<String> = list_categories(&ctx)
        .await
        .expect("list")
        .categories
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(titles, vec!["Drums", "Guitar", "Piano"]);
}

#[tokio::test]
async fn detail_lists_referencing_items() {
    let ctx = setup().await;
    let drums = ctx.storage.create_category("Drums", "d").await.expect("drums");
    stock_item(&ctx, "Pearl Export EXX 20", drums).await;
    stock_item(&ctx, "Gretsch Catalina Maple", drums).await;

    let view = get_category_detail(&ctx, drums).await.expect("detail");
    assert_eq!(view.category.as_ref().map(|c| c.id), Some(drums));
    let names: Vec<&str> = view.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Gretsch Catalina Maple", "Pearl Export EXX 20"]);
}

#[tokio::test]
async fn detail_of_missing_category_passes_none_through() {
    let ctx = setup().await;
    let view = get_category_detail(&ctx, CategoryId::generate())
        .await
        .expect("detail");
    assert!(view.category.is_none());
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn update_form_for_unknown_category_is_not_found() {
    let ctx = setup().await;
    let err = render_update_form(&ctx, CategoryId::generate())
        .await
        .expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::NotFound));
}

#[tokio::test]
async fn update_requires_secret() {
    let ctx = setup().await;
    let id = ctx.storage.create_category("Amps", "d").await.expect("amps");

    let view = update_category(&ctx, id, &category_form("Amplifiers", "d", "wrong"))
        .await
        .expect("update")
        .into_view()
        .expect("rerender");
    assert_eq!(view.title, "Update Category");
    assert_eq!(view.errors, vec![FieldError::new("password", PASSWORD_INCORRECT)]);
    assert_eq!(
        view.category.and_then(|c| c.id),
        Some(id.to_string())
    );
    let stored = ctx.storage.get_category(id).await.expect("get").expect("category");
    assert_eq!(stored.title, "Amps");

    let outcome = update_category(&ctx, id, &category_form("Amplifiers", "loud", SECRET))
        .await
        .expect("update");
    assert_eq!(outcome.redirect_target(), Some(id.url().as_str()));
    let stored = ctx.storage.get_category(id).await.expect("get").expect("category");
    assert_eq!(stored.title, "Amplifiers");
    assert_eq!(stored.description, "loud");
}

#[tokio::test]
async fn update_of_vanished_category_is_not_found() {
    let ctx = setup().await;
    let err = update_category(
        &ctx,
        CategoryId::generate(),
        &category_form("x", "y", SECRET),
    )
    .await
    .expect_err("should fail");
    assert!(matches!(err.code, ErrorCode::NotFound));
}

#[tokio::test]
async fn delete_confirm_redirects_when_category_missing() {
    let ctx = setup().await;
    let outcome = render_delete_confirm(&ctx, CategoryId::generate())
        .await
        .expect("confirm");
    assert_eq!(outcome.redirect_target(), Some("/category"));
}

#[tokio::test]
async fn delete_is_blocked_while_items_reference_category() {
    let ctx = setup().await;
    let c1 = ctx.storage.create_category("Guitar", "g").await.expect("c1");
    stock_item(&ctx, "Fender Stratocaster", c1).await;

    let confirm = render_delete_confirm(&ctx, c1)
        .await
        .expect("confirm")
        .into_view()
        .expect("view");
    assert!(confirm.is_blocked());

    for _ in 0..2 {
        let view = delete_category(&ctx, c1, &password(SECRET))
            .await
            .expect("delete")
            .into_view()
            .expect("refused");
        assert!(view.is_blocked());
        assert!(view.errors.is_empty());
        assert_eq!(view.items[0].name, "Fender Stratocaster");
        assert!(ctx.storage.get_category(c1).await.expect("get").is_some());
    }
}

#[tokio::test]
async fn blocked_delete_ignores_password() {
    let ctx = setup().await;
    let c1 = ctx.storage.create_category("Guitar", "g").await.expect("c1");
    stock_item(&ctx, "Fender Stratocaster", c1).await;

    let view = delete_category(&ctx, c1, &password("wrong"))
        .await
        .expect("delete")
        .into_view()
        .expect("refused");
    assert!(view.errors.is_empty());
    assert!(view.is_blocked());
}

#[tokio::test]
async fn delete_succeeds_once_no_item_references_category() {
    let ctx = setup().await;
    let c1 = ctx.storage.create_category("Guitar", "g").await.expect("c1");
    stock_item(&ctx, "Fender Stratocaster", c1).await;
    let item_id = ctx.storage.list_items().await.expect("items")[0].id;
    ctx.storage.delete_item(item_id).await.expect("delete item");

    let refused = delete_category(&ctx, c1, &password("wrong"))
        .await
        .expect("delete")
        .into_view()
        .expect("password rejected");
    assert!(!refused.is_blocked());
    assert_eq!(refused.errors, vec![FieldError::new("password", PASSWORD_INCORRECT)]);

    let outcome = delete_category(&ctx, c1, &password(SECRET))
        .await
        .expect("delete");
    assert_eq!(outcome.redirect_target(), Some("/category"));
    assert!(ctx.storage.get_category(c1).await.expect("get").is_none());
}

#[test]
fn create_form_starts_empty() {
    let view = render_create_form();
    assert_eq!(view.title, "Create Category");
    assert!(view.category.is_none());
    assert!(view.errors.is_empty());
}
