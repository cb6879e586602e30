use crate::config::Config;
use crate::error::AppError;
use crate::utils::state::AppState;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::Utc;
use common::{FileEntry, HealthResponse, ListResponse};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Debug, Default)]
pub struct ListQuery {
    /// Last key of the previous page.
    pub cursor: Option<String>,
}

/// GET /_list[?cursor=<key>]
///
/// Keys come back in lexicographic order, capped at `max_list_results`.
/// A truncated page carries the cursor to pass for the next one.
pub async fn list_objects_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let listing = state
        .storage
        .list(state.config.max_list_results, query.cursor.as_deref())
        .await?;
    let files: Vec<FileEntry> = listing.objects.into_iter().map(FileEntry::from).collect();

    tracing::info!(
        "Listed {} files{}",
        files.len(),
        if listing.truncated { " (truncated)" } else { "" }
    );
    Ok(Json(ListResponse::new(
        files,
        listing.truncated,
        listing.cursor,
    )))
}

/// GET /_health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: Config::version().to_string(),
        timestamp: Utc::now(),
    })
}
