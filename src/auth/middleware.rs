// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied with `route_layer` to every protected route:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/me", get(users::get_current_user))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));
//! ```
//!
//! On success the [`Identity`](super::Identity) is inserted into the request
//! extensions, where the [`CurrentUser`](super::CurrentUser) extractor picks
//! it up.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use super::AuthError;
use crate::state::AppState;

/// Authentication middleware function.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            warn!(reason = e.error_code(), path = %request.uri().path(), "Rejected request");
            return e.into_response();
        }
    };

    let identity = match state.verifier.authenticate(token).await {
        Ok(identity) => identity,
        Err(failure) => {
            if failure.is_key_unavailable() {
                error!(reason = failure.reason(), error = %failure, "Signing keys unavailable, rejecting token");
            } else {
                warn!(reason = failure.reason(), error = %failure, "Token verification failed");
            }
            return AuthError::from(failure).into_response();
        }
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}
