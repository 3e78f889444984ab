use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects the request with 401 unless `X-API-KEY` equals the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let header_present = supplied.is_some();
    let authorized = supplied.is_some_and(|key| keys_match(key, &state.api_key));

    if !authorized {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            header_present,
            "Rejected request without valid API key"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

fn keys_match(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}
