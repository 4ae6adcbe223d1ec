// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cognito access token verification.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. three-segment structure with a JSON header
//! 2. RSA signing algorithm (`none`, HMAC and EC are refused)
//! 3. `kid` present and known to the key cache
//! 4. signature
//! 5. `iss` equals the user pool issuer
//! 6. `token_use` is `access`
//! 7. `client_id` equals the app client
//! 8. `exp` strictly after now, with no clock skew leeway

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use serde::Deserialize;

use super::cache::KeyCache;
use super::claims::{Claims, Identity};
use super::error::VerificationFailure;

/// The only token purpose accepted by the API.
const ACCESS_TOKEN_USE: &str = "access";

/// The part of the JOSE header needed before a key is chosen.
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Verifies access tokens issued by one Cognito user pool for one client.
pub struct TokenVerifier {
    keys: Arc<KeyCache>,
    issuer: String,
    client_id: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyCache>, issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            client_id: client_id.into(),
        }
    }

    pub fn keys(&self) -> &KeyCache {
        &self.keys
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify a token against the current time.
    pub async fn verify(&self, token: &str) -> Result<Claims, VerificationFailure> {
        self.verify_at(token, chrono::Utc::now().timestamp()).await
    }

    /// Verify a token as of `now` (Unix seconds).
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Claims, VerificationFailure> {
        let header = parse_header(token)?;

        let algorithm = rsa_algorithm(&header.alg)
            .ok_or_else(|| VerificationFailure::UnsupportedAlgorithm(header.alg.clone()))?;

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(VerificationFailure::Malformed("header has no key id"))?;

        let key = self.keys.get_key(&kid).await?;

        let claims = check_signature(token, key.decoding_key(), algorithm)?;

        self.check_claims(&claims, now)?;

        Ok(claims)
    }

    /// Verify a token and build the caller's identity from it.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, VerificationFailure> {
        let claims = self.verify(token).await?;
        Identity::from_claims(&claims)
    }

    fn check_claims(&self, claims: &Claims, now: i64) -> Result<(), VerificationFailure> {
        if claims.str("iss") != Some(self.issuer.as_str()) {
            return Err(VerificationFailure::WrongIssuer);
        }

        if claims.str("token_use") != Some(ACCESS_TOKEN_USE) {
            return Err(VerificationFailure::WrongPurpose);
        }

        // An unconfigured client id accepts nothing.
        match claims.str("client_id") {
            Some(client_id) if !self.client_id.is_empty() && client_id == self.client_id => {}
            _ => return Err(VerificationFailure::WrongAudience),
        }

        match claims.number("exp") {
            Some(exp) if exp > now as f64 => Ok(()),
            _ => Err(VerificationFailure::Expired),
        }
    }
}

fn parse_header(token: &str) -> Result<TokenHeader, VerificationFailure> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(VerificationFailure::Malformed("expected three segments"));
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(VerificationFailure::Malformed("empty segment"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| VerificationFailure::Malformed("header is not base64url"))?;

    serde_json::from_slice(&bytes)
        .map_err(|_| VerificationFailure::Malformed("header is not a JOSE header"))
}

fn rsa_algorithm(alg: &str) -> Option<Algorithm> {
    match alg {
        "RS256" => Some(Algorithm::RS256),
        "RS384" => Some(Algorithm::RS384),
        "RS512" => Some(Algorithm::RS512),
        "PS256" => Some(Algorithm::PS256),
        "PS384" => Some(Algorithm::PS384),
        "PS512" => Some(Algorithm::PS512),
        _ => None,
    }
}

/// Check the signature and decode the payload, with every built-in claim
/// check disabled so the claim rules above stay in one place.
fn check_signature(
    token: &str,
    key: &jsonwebtoken::DecodingKey,
    algorithm: Algorithm,
) -> Result<Claims, VerificationFailure> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidToken => {
                VerificationFailure::Malformed("payload could not be decoded")
            }
            _ => VerificationFailure::BadSignature,
        })
}
