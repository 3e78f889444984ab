use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;

use crate::config::Config;

/// Shared application state — cheap to clone (pool and key are reference counted).
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(db: SqlitePool, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            api_key: api_key.into(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,catalog_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("Catalog service starting");
    if config.uses_default_api_key() {
        warn!("API_KEY is not set; using the built-in development key");
    }

    info!(path = %config.database_path, "Opening SQLite database...");
    let pool = db::open_pool(&config.database_path)
        .await
        .with_context(|| format!("cannot open database at {}", config.database_path))?;
    db::ensure_schema(&pool)
        .await
        .context("failed to create the products table")?;
    info!("Schema ready.");

    let state = AppState::new(pool, config.api_key.as_str());
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    // ── Products CRUD (API key required) ────────────────────────────────────
    let products = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        // ── Health & metrics (open) ─────────────────────────────────────────
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(products)

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
