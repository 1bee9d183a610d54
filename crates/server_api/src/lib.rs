use shared::{
    error::{ApiError, ErrorCode},
    protocol::CatalogSummaryView,
};
use storage::Storage;

pub mod categories;
pub mod items;
pub mod validation;

pub use validation::{FormData, GateSecret};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub secret: GateSecret,
}

pub async fn catalog_summary(ctx: &ApiContext) -> Result<CatalogSummaryView, ApiError> {
    let counts = ctx.storage.counts().await.map_err(internal)?;
    Ok(CatalogSummaryView {
        title: "Music Store Inventory".to_string(),
        counts,
    })
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}
