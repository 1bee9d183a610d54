use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use server_api::{catalog_summary, categories, items, ApiContext, FormData, GateSecret};
use shared::{
    domain::{CategoryId, ItemId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::FormOutcome,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod views;

use app_state::AppState;
use config::load_settings;
use views::Views;

const MAX_FORM_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = settings.database_url;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        secret: GateSecret::new(settings.gate_password),
    };
    let state = AppState {
        api,
        views: Views::new()?,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "inventory server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/item", get(item_list))
        .route("/item/create", get(item_create_form).post(item_create))
        .route("/item/:id", get(item_detail))
        .route("/item/:id/update", get(item_update_form).post(item_update))
        .route("/item/:id/delete", get(item_delete_confirm).post(item_delete))
        .route("/category", get(category_list))
        .route(
            "/category/create",
            get(category_create_form).post(category_create),
        )
        .route("/category/:id", get(category_detail))
        .route(
            "/category/:id/update",
            get(category_update_form).post(category_update),
        )
        .route(
            "/category/:id/delete",
            get(category_delete_confirm).post(category_delete),
        )
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    match state.api.storage.health_check().await {
        Ok(()) => "ok".into_response(),
        Err(error) => {
            warn!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response()
        }
    }
}

async fn home(State(state): State<Arc<AppState>>) -> Response {
    let result = catalog_summary(&state.api).await;
    page(&state, views::INDEX, result)
}

async fn item_list(State(state): State<Arc<AppState>>) -> Response {
    let result = items::list_items(&state.api).await;
    page(&state, views::ITEM_LIST, result)
}

async fn item_detail(State(state): State<Arc<AppState>>, Path(raw): Path<String>) -> Response {
    let item_id = match parse_id::<ItemId>(&raw, "Item not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = items::get_item_detail(&state.api, item_id).await;
    page(&state, views::ITEM_DETAIL, result)
}

async fn item_create_form(State(state): State<Arc<AppState>>) -> Response {
    let result = items::render_create_form(&state.api).await;
    page(&state, views::ITEM_FORM, result)
}

async fn item_create(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let form = FormData::parse(&body);
    let result = items::create_item(&state.api, &form).await;
    outcome(&state, views::ITEM_FORM, result)
}

async fn item_update_form(State(state): State<Arc<AppState>>, Path(raw): Path<String>) -> Response {
    let item_id = match parse_id::<ItemId>(&raw, "Item not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = items::render_update_form(&state.api, item_id).await;
    page(&state, views::ITEM_FORM, result)
}

async fn item_update(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    let item_id = match parse_id::<ItemId>(&raw, "Item not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let form = FormData::parse(&body);
    let result = items::update_item(&state.api, item_id, &form).await;
    outcome(&state, views::ITEM_FORM, result)
}

async fn item_delete_confirm(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Response {
    let item_id = match parse_id::<ItemId>(&raw, "Item not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = items::render_delete_confirm(&state.api, item_id).await;
    outcome(&state, views::ITEM_DELETE, result)
}

async fn item_delete(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    let item_id = match parse_id::<ItemId>(&raw, "Item not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let form = FormData::parse(&body);
    let result = items::delete_item(&state.api, item_id, &form).await;
    outcome(&state, views::ITEM_DELETE, result)
}

async fn category_list(State(state): State<Arc<AppState>>) -> Response {
    let result = categories::list_categories(&state.api).await;
    page(&state, views::CATEGORY_LIST, result)
}

async fn category_detail(State(state): State<Arc<AppState>>, Path(raw): Path<String>) -> Response {
    let category_id = match parse_id::<CategoryId>(&raw, "Category not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = categories::get_category_detail(&state.api, category_id).await;
    page(&state, views::CATEGORY_DETAIL, result)
}

async fn category_create_form(State(state): State<Arc<AppState>>) -> Response {
    render(&state, views::CATEGORY_FORM, &categories::render_create_form())
}

async fn category_create(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let form = FormData::parse(&body);
    let result = categories::create_category(&state.api, &form).await;
    outcome(&state, views::CATEGORY_FORM, result)
}

async fn category_update_form(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Response {
    let category_id = match parse_id::<CategoryId>(&raw, "Category not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = categories::render_update_form(&state.api, category_id).await;
    page(&state, views::CATEGORY_FORM, result)
}

async fn category_update(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    let category_id = match parse_id::<CategoryId>(&raw, "Category not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let form = FormData::parse(&body);
    let result = categories::update_category(&state.api, category_id, &form).await;
    outcome(&state, views::CATEGORY_FORM, result)
}

async fn category_delete_confirm(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Response {
    let category_id = match parse_id::<CategoryId>(&raw, "Category not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let result = categories::render_delete_confirm(&state.api, category_id).await;
    outcome(&state, views::CATEGORY_DELETE, result)
}

async fn category_delete(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    let category_id = match parse_id::<CategoryId>(&raw, "Category not found") {
        Ok(id) => id,
        Err(err) => return failure(&state, err),
    };
    let form = FormData::parse(&body);
    let result = categories::delete_category(&state.api, category_id, &form).await;
    outcome(&state, views::CATEGORY_DELETE, result)
}

/// Path segments that are not ids name nothing, so they are answered like a
/// missing record.
fn parse_id<T: FromStr>(raw: &str, not_found: &str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(not_found))
}

fn page<V: Serialize>(state: &AppState, template: &str, result: Result<V, ApiError>) -> Response {
    match result {
        Ok(view) => render(state, template, &view),
        Err(err) => failure(state, err),
    }
}

fn outcome<V: Serialize>(
    state: &AppState,
    template: &str,
    result: Result<FormOutcome<V>, ApiError>,
) -> Response {
    match result {
        Ok(FormOutcome::Redirect(target)) => Redirect::to(&target).into_response(),
        Ok(FormOutcome::Render(view)) => render(state, template, &view),
        Err(err) => failure(state, err),
    }
}

fn render<V: Serialize>(state: &AppState, template: &str, view: &V) -> Response {
    match state.views.render(template, view) {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            error!(template, error = %format!("{error:#}"), "page render failed");
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let body = state.views.error_page(status, "Internal server error");
            (status, Html(body)).into_response()
        }
    }
}

fn failure(state: &AppState, err: ApiError) -> Response {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if status.is_server_error() {
        let exception = ApiException::from(err);
        error!(error = %exception, "request failed");
        "Internal server error".to_string()
    } else {
        err.message
    };
    let body = state.views.error_page(status, &message);
    (status, Html(body)).into_response()
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
