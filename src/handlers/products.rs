use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{
    db,
    error::{AppError, AppResult},
    models::{Product, ProductPayload},
    AppState,
};

/// Only plain decimal digits name a stored product; signs and spaces do not.
fn parse_id(raw: &str) -> AppResult<i64> {
    let not_found = || AppError::NotFound(format!("Product {} not found", raw));
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_found());
    }
    raw.parse().map_err(|_| not_found())
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<Product>>)> {
    let products = db::fetch_all_products(&state.db).await?;

    info!(count = products.len(), "Listed products");

    Ok((StatusCode::OK, Json(products)))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Product>)> {
    let fields = ProductPayload::from_slice(&body)?.into_new_product()?;
    let product = db::insert_product(&state.db, &fields).await?;

    info!(id = product.id, name = %product.name, "Created product");

    Ok((StatusCode::CREATED, Json(product)))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let id = parse_id(&id)?;
    let product = db::fetch_product_by_id(&state.db, id).await?;

    info!(id, "Fetched product");

    Ok((StatusCode::OK, Json(product)))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Product>)> {
    let id = parse_id(&id)?;
    let payload = ProductPayload::from_slice(&body)?;

    // Read-before-write: unspecified fields keep their stored values.
    let existing = db::fetch_product_by_id(&state.db, id).await?;
    let fields = payload.merge_onto(&existing)?;
    let product = db::update_product(&state.db, id, &fields).await?;

    info!(id, "Updated product");

    Ok((StatusCode::OK, Json(product)))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let id = parse_id(&id)?;
    db::delete_product(&state.db, id).await?;

    info!(id, "Deleted product");

    Ok((StatusCode::OK, Json(json!({ "deleted": id }))))
}
