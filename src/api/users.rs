// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::{CurrentUser, Identity};
use crate::models::ErrorResponse;

/// Get the current authenticated user's profile.
///
/// The profile comes straight from the verified access token; nothing is
/// stored server-side.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User profile", body = Identity),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ErrorResponse),
    )
)]
pub async fn get_current_user(CurrentUser(user): CurrentUser) -> Json<Identity> {
    Json(user)
}
