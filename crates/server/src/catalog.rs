//! Read-only catalog endpoints backing the wizard steps.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::error;

use portico_core::domain::catalog::{CatalogKind, ProductLine};
use portico_db::repositories::CatalogRepository;

#[derive(Clone)]
pub struct CatalogState {
    pub catalog: Arc<dyn CatalogRepository>,
}

#[derive(Debug, Serialize)]
struct CatalogError {
    error: String,
}

pub fn router(state: CatalogState) -> Router {
    Router::new().route("/api/catalog/{line}/{kind}", get(list_step_options)).with_state(state)
}

/// Entries are re-read on every call; the wizard treats catalog data as
/// fully fresh per step render.
async fn list_step_options(
    State(state): State<CatalogState>,
    Path((line_raw, kind_raw)): Path<(String, String)>,
) -> Response {
    let Some(product_line) = ProductLine::parse(&line_raw) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(CatalogError { error: format!("unknown product line `{line_raw}`") }),
        )
            .into_response();
    };

    let Some(kind) = CatalogKind::parse(&kind_raw) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(CatalogError { error: format!("unknown catalog kind `{kind_raw}`") }),
        )
            .into_response();
    };

    match state.catalog.list_active(product_line, kind).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => {
            error!(
                event_name = "catalog.list.failed",
                product_line = %product_line,
                kind = kind.as_str(),
                error = %err,
                "catalog read failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CatalogError { error: "catalog is temporarily unavailable".to_string() }),
            )
                .into_response()
        }
    }
}
