pub mod products;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::{db, error::AppResult, models::utc_timestamp, AppState};

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "time": utc_timestamp() })))
}

pub async fn metrics(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let count = db::count_products(&state.db).await?;
    Ok((StatusCode::OK, Json(json!({ "products": count }))))
}
