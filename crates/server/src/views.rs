//! Tera rendering for the catalog pages. Templates are compiled into the
//! binary and autoescaped.

use anyhow::{Context as _, Result};
use axum::http::StatusCode;
use serde::Serialize;
use tera::{Context, Tera};

pub(crate) const INDEX: &str = "index.html";
pub(crate) const ITEM_LIST: &str = "item_list.html";
pub(crate) const ITEM_DETAIL: &str = "item_detail.html";
pub(crate) const ITEM_FORM: &str = "item_form.html";
pub(crate) const ITEM_DELETE: &str = "item_delete.html";
pub(crate) const CATEGORY_LIST: &str = "category_list.html";
pub(crate) const CATEGORY_DETAIL: &str = "category_detail.html";
pub(crate) const CATEGORY_FORM: &str = "category_form.html";
pub(crate) const CATEGORY_DELETE: &str = "category_delete.html";
const ERROR: &str = "error.html";

const TEMPLATES: [(&str, &str); 12] = [
    ("layout.html", include_str!("../templates/layout.html")),
    ("errors.html", include_str!("../templates/errors.html")),
    (ERROR, include_str!("../templates/error.html")),
    (INDEX, include_str!("../templates/index.html")),
    (ITEM_LIST, include_str!("../templates/item_list.html")),
    (ITEM_DETAIL, include_str!("../templates/item_detail.html")),
    (ITEM_FORM, include_str!("../templates/item_form.html")),
    (ITEM_DELETE, include_str!("../templates/item_delete.html")),
    (CATEGORY_LIST, include_str!("../templates/category_list.html")),
    (CATEGORY_DETAIL, include_str!("../templates/category_detail.html")),
    (CATEGORY_FORM, include_str!("../templates/category_form.html")),
    (CATEGORY_DELETE, include_str!("../templates/category_delete.html")),
];

#[derive(Serialize)]
struct ErrorView<'a> {
    title: &'a str,
    status: u16,
    message: &'a str,
}

pub(crate) struct Views {
    tera: Tera,
}

impl Views {
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .context("failed to compile page templates")?;
        Ok(Self { tera })
    }

    pub(crate) fn render<V: Serialize>(&self, template: &str, view: &V) -> Result<String> {
        let context = Context::from_serialize(view)
            .with_context(|| format!("view for {template} is not a map"))?;
        self.tera
            .render(template, &context)
            .with_context(|| format!("failed to render {template}"))
    }

    pub(crate) fn error_page(&self, status: StatusCode, message: &str) -> String {
        let view = ErrorView {
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            message,
        };
        self.render(ERROR, &view)
            .unwrap_or_else(|_| format!("{} {message}", status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        domain::{Category, CategoryId, ItemDetail, ItemId},
        protocol::{CategoryChoice, FieldError, ItemDetailView, ItemFormValues, ItemFormView},
    };

    #[test]
    fn every_template_compiles() {
        Views::new().expect("templates");
    }

    #[test]
    fn item_form_marks_checked_categories_and_lists_errors() {
        let views = Views::new().expect("templates");
        let picked = CategoryId::generate();
        let view = ItemFormView {
            title: "Create Item".into(),
            item: Some(ItemFormValues {
                name: "Strat".into(),
                ..ItemFormValues::default()
            }),
            categories: vec![CategoryChoice {
                category: Category {
                    id: picked,
                    title: "Guitar".into(),
                    description: "g".into(),
                },
                checked: true,
            }],
            errors: vec![FieldError::new("price", "please enter a non-negative price value")],
        };

        let html = views.render(ITEM_FORM, &view).expect("render");
        assert!(html.contains(&format!("value=\"{picked}\" checked")));
        assert!(html.contains("please enter a non-negative price value"));
        assert!(html.contains("value=\"Strat\""));
    }

    #[test]
    fn detail_page_links_through_record_urls() {
        let views = Views::new().expect("templates");
        let item_id = ItemId::generate();
        let category_id = CategoryId::generate();
        let view = ItemDetailView {
            title: "Instrument Detail".into(),
            item: Some(ItemDetail {
                id: item_id,
                name: "Fender Stratocaster".into(),
                description: "d".into(),
                price: "849.99".into(),
                number_in_stock: 10,
                categories: vec![Category {
                    id: category_id,
                    title: "Guitar".into(),
                    description: "g".into(),
                }],
            }),
        };

        let html = views.render(ITEM_DETAIL, &view).expect("render");
        assert!(html.contains(&format!("href=\"{}\"", category_id.url())));
        assert!(html.contains(&format!("href=\"{}/update\"", item_id.url())));
        assert!(html.contains(&format!("href=\"{}/delete\"", item_id.url())));
    }

    #[test]
    fn error_page_shows_status_and_message() {
        let views = Views::new().expect("templates");
        let html = views.error_page(StatusCode::NOT_FOUND, "Item not found");
        assert!(html.contains("Item not found"));
        assert!(html.contains("404"));
    }
}
