//! Record page handler.

use axum::{extract::State, response::Html, routing::get, Router};

use crate::api::AppState;
use crate::errors::AppResult;
use crate::views::render_record_list;

/// Create record page routes
pub fn record_routes() -> Router<AppState> {
    Router::new().route("/", get(list_records))
}

/// Render every record, unfiltered
pub async fn list_records(State(state): State<AppState>) -> AppResult<Html<String>> {
    let records = state.record_service.list_records().await?;
    tracing::debug!(count = records.len(), "Rendering record list");

    Ok(Html(render_record_list(&records)))
}
