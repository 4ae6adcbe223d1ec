// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{KeyCache, KeySourceClient, KeySourceError, TokenVerifier};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Wire the key source, cache and verifier for the configured user pool.
    pub fn from_config(config: &Config) -> Result<Self, KeySourceError> {
        let source = KeySourceClient::new(config.cognito.jwks_url())?;
        let keys = KeyCache::new(source).with_cache_ttl(config.jwks_cache_ttl);
        Ok(Self::new(TokenVerifier::new(
            Arc::new(keys),
            config.cognito.issuer(),
            config.cognito.client_id.clone(),
        )))
    }
}
