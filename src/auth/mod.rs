// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cognito JWT authentication for the profile API.
//!
//! ## Auth Flow
//!
//! 1. Clients sign in with the Cognito user pool (hosted UI or native SDK)
//! 2. Clients send `Authorization: Bearer <Cognito access token>`
//! 3. The server:
//!    - Fetches the user pool JWKS via HTTPS and caches it for an hour
//!    - Verifies algorithm, signature, issuer, `token_use`, `client_id`, expiry
//!    - Extracts `sub`, email, name and picture into an [`Identity`]
//!
//! ## Security
//!
//! - Only RSA algorithms are accepted; `none` and HMAC are refused up front
//! - Expiry is checked strictly, with no clock skew leeway
//! - Every rejection answers with the same 401 body; reasons only reach logs

pub mod cache;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{KeyCache, VerificationKey};
pub use claims::{Claims, Identity};
pub use error::{AuthError, KeyCacheError, KeySourceError, VerificationFailure};
pub use extractor::CurrentUser;
pub use jwks::KeySourceClient;
pub use verifier::TokenVerifier;
