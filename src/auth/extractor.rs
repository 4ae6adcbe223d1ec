// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the authenticated user.
//!
//! ```rust,ignore
//! async fn my_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     // user is Identity
//! }
//! ```
//!
//! The identity is placed in the request extensions by
//! [`authenticate`](super::middleware::authenticate); this extractor never
//! verifies tokens itself.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Identity};

/// Identity of the caller, taken from the request extensions.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::MissingIdentity)
    }
}
