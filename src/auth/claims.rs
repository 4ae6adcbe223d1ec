// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::error::VerificationFailure;

/// Claim holding the Cognito user name, used when `email` is absent.
const COGNITO_USERNAME_CLAIM: &str = "cognito:username";

/// Claims decoded from a token payload.
///
/// Kept as a loose map: Cognito access and ID tokens carry different claim
/// sets and only a handful are ever read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Claims(HashMap<String, Value>);

impl Claims {
    /// String claim, `None` if absent or not a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Numeric claim, `None` if absent or not a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }
}

/// Authenticated user information extracted from JWT.
///
/// This is the type handed to handlers for the user making a request. It is
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Cognito subject, unique and stable per user
    pub sub: String,
    /// Email address, or the Cognito user name when the token has no email
    pub email: String,
    /// Display name from the identity provider
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Profile picture URL from the identity provider
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picture: String,
}

impl Identity {
    /// Build the identity from verified claims.
    pub fn from_claims(claims: &Claims) -> Result<Self, VerificationFailure> {
        let sub = claims
            .str("sub")
            .filter(|sub| !sub.is_empty())
            .ok_or(VerificationFailure::MissingSubject)?;

        let email = claims
            .str("email")
            .filter(|email| !email.is_empty())
            .or_else(|| claims.str(COGNITO_USERNAME_CLAIM))
            .unwrap_or_default();

        Ok(Self {
            sub: sub.to_string(),
            email: email.to_string(),
            name: claims.str("name").unwrap_or_default().to_string(),
            picture: claims.str("picture").unwrap_or_default().to_string(),
        })
    }
}
