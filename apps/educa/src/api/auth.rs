//! # Authentication Module
//!
//! Two schemes guard the Educa API:
//!
//! - **Users** authenticate with HTTP Basic credentials on every request:
//!   ```text
//!   Authorization: Basic base64(username:password)
//!   ```
//!   The [`AuthUser`] and [`Instructor`] extractors check them against the store.
//! - **Administrators** send the configured API key:
//!   ```text
//!   Authorization: Bearer <api-key>
//!   ```
//!   checked by [`api_key_auth_middleware`] on `/api/admin/*`.

use super::{AppState, error::ApiError, types::ErrorResponse};
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use educa_core::{EducaError, User};
use std::sync::Arc;
use subtle::ConstantTimeEq;

// =============================================================================
// BASIC AUTHENTICATION
// =============================================================================

/// The user behind valid Basic credentials.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// An authenticated user with the instructor role.
#[derive(Debug, Clone)]
pub struct Instructor(pub User);

/// Decode `Authorization: Basic ...` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some((username, password)) = basic_credentials(&parts.headers) else {
            tracing::debug!(
                event = "auth_failure",
                reason = "missing_credentials",
                path = %parts.uri.path()
            );
            return Err(ApiError::Unauthorized);
        };

        // Password stretching is CPU-bound; keep it off the async workers.
        let store = Arc::clone(&state.store);
        let login = username.clone();
        let user = tokio::task::spawn_blocking(move || store.authenticate(&login, &password))
            .await??;

        match user {
            Some(user) => Ok(Self(user)),
            None => {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_credentials",
                    username = %username,
                    "Authentication failed"
                );
                Err(ApiError::Unauthorized)
            }
        }
    }
}

impl FromRequestParts<AppState> for Instructor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.is_instructor() {
            Ok(Self(user))
        } else {
            Err(EducaError::Forbidden.into())
        }
    }
}

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Constant-time comparison of a provided key against the expected one.
///
/// Both keys are padded to the same length so `ct_eq` always runs over the
/// same number of bytes.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// Admin API key middleware.
///
/// Accepts `Authorization: Bearer <key>` or the raw key. Admin routes are
/// only mounted when a key is configured; a missing key here still denies.
pub async fn api_key_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin_key() else {
        return unauthorized();
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if keys_match(key, expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                "Authentication failed: invalid API key"
            );
            unauthorized()
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized")),
    )
        .into_response()
}

// =============================================================================
// TESTS
// =============================================================================
