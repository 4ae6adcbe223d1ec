// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching.
//!
//! ## Security
//!
//! - One bounded request per fetch (10 second timeout)
//! - Non-2xx responses are hard failures, nothing is retried here
//! - Only RSA signing keys survive parsing; anything else is dropped
//!
//! Caching lives in [`super::cache::KeyCache`]; this client only talks to
//! the network.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use tracing::debug;

use super::error::KeySourceError;

/// Timeout for a single JWKS request.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A single JSON Web Key as published by the identity provider.
///
/// Every field is optional on the wire so one incomplete record never fails
/// the whole document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID
    #[serde(default)]
    pub kid: Option<String>,
    /// Key type (RSA)
    #[serde(default)]
    pub kty: Option<String>,
    /// Key use (sig)
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    /// RSA modulus, base64url without padding
    #[serde(default)]
    pub n: Option<String>,
    /// RSA exponent, base64url without padding
    #[serde(default)]
    pub e: Option<String>,
}

/// The JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

/// An RSA signing key that passed structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyRecord {
    pub kid: String,
    /// Big-endian modulus bytes
    pub modulus: Vec<u8>,
    /// Big-endian exponent bytes
    pub exponent: Vec<u8>,
}

impl RawKeyRecord {
    /// Convert a JWK into a key record.
    ///
    /// Returns `None` for anything that is not a complete RSA signing key.
    pub fn from_jwk(jwk: &Jwk) -> Option<Self> {
        if jwk.kty.as_deref() != Some("RSA") || jwk.key_use.as_deref() != Some("sig") {
            return None;
        }

        let kid = jwk.kid.as_deref().filter(|kid| !kid.is_empty())?;
        let modulus = URL_SAFE_NO_PAD.decode(jwk.n.as_deref()?).ok()?;
        let exponent = URL_SAFE_NO_PAD.decode(jwk.e.as_deref()?).ok()?;

        if modulus.is_empty() || exponent.is_empty() {
            return None;
        }

        Some(Self {
            kid: kid.to_string(),
            modulus,
            exponent,
        })
    }
}

impl JwksDocument {
    /// Keep the usable RSA signing keys, silently dropping the rest.
    pub fn into_records(self) -> Vec<RawKeyRecord> {
        self.keys
            .iter()
            .filter_map(|jwk| {
                let record = RawKeyRecord::from_jwk(jwk);
                if record.is_none() {
                    debug!(
                        kid = jwk.kid.as_deref().unwrap_or("<none>"),
                        kty = jwk.kty.as_deref().unwrap_or("<none>"),
                        key_use = jwk.key_use.as_deref().unwrap_or("<none>"),
                        "Skipping JWK that is not a usable RSA signing key"
                    );
                }
                record
            })
            .collect()
    }
}

/// HTTP client for the identity provider's JWKS endpoint.
#[derive(Clone)]
pub struct KeySourceClient {
    /// JWKS endpoint URL
    jwks_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySourceClient {
    /// Create a client for the given JWKS URL.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, KeySourceError> {
        Self::with_timeout(jwks_url, FETCH_TIMEOUT)
    }

    /// Create a client whose requests are abandoned after `timeout`.
    pub fn with_timeout(
        jwks_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, KeySourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySourceError::Client(e.to_string()))?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
        })
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch the key set and return its usable RSA signing keys.
    ///
    /// The result may be empty; deciding what an empty set means is the
    /// cache's job.
    pub async fn fetch_keys(&self) -> Result<Vec<RawKeyRecord>, KeySourceError> {
        debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| KeySourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySourceError::HttpStatus(status.as_u16()));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| KeySourceError::Decode(e.to_string()))?;

        Ok(document.into_records())
    }
}
