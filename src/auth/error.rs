// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Internally every failure keeps its precise reason so it can be logged.
//! Externally they all collapse into a 401 with one of three messages.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::ApiError;

/// Failure fetching the key set from the identity provider.
#[derive(Debug, Clone, Error)]
pub enum KeySourceError {
    #[error("JWKS HTTP client could not be built: {0}")]
    Client(String),
    #[error("JWKS request failed: {0}")]
    Network(String),
    #[error("JWKS endpoint returned HTTP {0}")]
    HttpStatus(u16),
    #[error("JWKS response could not be decoded: {0}")]
    Decode(String),
}

/// Failure resolving a verification key.
#[derive(Debug, Clone, Error)]
pub enum KeyCacheError {
    /// The key set was refreshed and still does not contain the key ID.
    #[error("key {0} not found in JWKS")]
    KeyNotFound(String),
    /// The fetch itself failed.
    #[error("JWKS refresh failed: {0}")]
    Refresh(#[from] KeySourceError),
    /// The fetch succeeded but carried no usable RSA signing keys.
    #[error("JWKS contained no usable RSA signing keys")]
    EmptyKeySet,
}

/// Why a token was not accepted.
#[derive(Debug, Clone, Error)]
pub enum VerificationFailure {
    #[error("token is malformed: {0}")]
    Malformed(&'static str),
    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("no signing key with id {0:?}")]
    UnknownKey(String),
    #[error("signing keys unavailable: {0}")]
    KeyUnavailable(String),
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token issuer is invalid")]
    WrongIssuer,
    #[error("token client is invalid")]
    WrongAudience,
    #[error("token is not an access token")]
    WrongPurpose,
    #[error("token has expired")]
    Expired,
    #[error("token has no subject")]
    MissingSubject,
}

impl VerificationFailure {
    /// Stable tag for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationFailure::Malformed(_) => "malformed_token",
            VerificationFailure::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            VerificationFailure::UnknownKey(_) => "unknown_key",
            VerificationFailure::KeyUnavailable(_) => "key_unavailable",
            VerificationFailure::BadSignature => "invalid_signature",
            VerificationFailure::WrongIssuer => "invalid_issuer",
            VerificationFailure::WrongAudience => "invalid_audience",
            VerificationFailure::WrongPurpose => "invalid_token_use",
            VerificationFailure::Expired => "token_expired",
            VerificationFailure::MissingSubject => "missing_subject",
        }
    }

    /// Whether the failure is on our side (key set unreachable) rather than
    /// the caller's token.
    pub fn is_key_unavailable(&self) -> bool {
        matches!(self, VerificationFailure::KeyUnavailable(_))
    }
}

impl From<KeyCacheError> for VerificationFailure {
    fn from(err: KeyCacheError) -> Self {
        match err {
            KeyCacheError::KeyNotFound(kid) => VerificationFailure::UnknownKey(kid),
            other => VerificationFailure::KeyUnavailable(other.to_string()),
        }
    }
}

/// Request gate rejection.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Missing authorization header")]
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,
    /// Token failed verification or identity extraction
    #[error("Invalid or expired token")]
    InvalidToken(#[source] VerificationFailure),
    /// Handler reached without an authenticated identity
    #[error("User not found in context")]
    MissingIdentity,
}

impl AuthError {
    /// Get the error code for this error (log field, never sent to clients).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken(failure) => failure.reason(),
            AuthError::MissingIdentity => "missing_identity",
        }
    }
}

impl From<VerificationFailure> for AuthError {
    fn from(failure: VerificationFailure) -> Self {
        AuthError::InvalidToken(failure)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Display only carries the generic message; the reason stays in logs.
        ApiError::unauthorized(self.to_string()).into_response()
    }
}
