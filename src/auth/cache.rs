// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification key cache.
//!
//! Holds the identity provider's RSA keys by key ID with a single expiry for
//! the whole set.
//!
//! ## Refresh policy
//!
//! - A fresh set that contains the key ID answers without I/O.
//! - A miss or an expired set triggers a refresh. Refreshes are single-flight:
//!   callers that queue behind an in-flight refresh reuse its outcome.
//! - A successful refresh replaces the whole set, so keys missing from the
//!   new document stop verifying immediately.
//! - A refresh that yields no usable keys is a failure and keeps the previous
//!   set, which goes on serving hits until its original expiry. Availability
//!   wins over freshness here.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::KeyCacheError;
use super::jwks::{KeySourceClient, RawKeyRecord};

/// Default key set TTL (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// An RSA public key ready for signature checks.
pub struct VerificationKey {
    kid: String,
    modulus: Vec<u8>,
    exponent: Vec<u8>,
    decoding_key: DecodingKey,
}

impl VerificationKey {
    pub fn from_record(record: RawKeyRecord) -> Self {
        let decoding_key = DecodingKey::from_rsa_raw_components(&record.modulus, &record.exponent);
        Self {
            kid: record.kid,
            modulus: record.modulus,
            exponent: record.exponent,
            decoding_key,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .field("modulus_bits", &(self.modulus.len() * 8))
            .finish()
    }
}

/// Keys from one refresh, sharing one expiry.
#[derive(Default)]
struct KeySet {
    keys: HashMap<String, Arc<VerificationKey>>,
    /// `None` until the first successful refresh.
    expires_at: Option<Instant>,
}

impl KeySet {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    fn fresh_key(&self, kid: &str, now: Instant) -> Option<Arc<VerificationKey>> {
        if self.is_fresh(now) {
            self.keys.get(kid).cloned()
        } else {
            None
        }
    }
}

/// Shared, single-flight cache of verification keys.
pub struct KeyCache {
    source: KeySourceClient,
    ttl: Duration,
    current: RwLock<KeySet>,
    /// Serializes refreshes and remembers how the last one failed, if it did.
    refresh: Mutex<Option<KeyCacheError>>,
    /// Bumped after every refresh attempt, successful or not.
    epoch: AtomicU64,
}

impl KeyCache {
    /// Create an empty cache backed by the given key source.
    pub fn new(source: KeySourceClient) -> Self {
        Self {
            source,
            ttl: DEFAULT_CACHE_TTL,
            current: RwLock::new(KeySet::default()),
            refresh: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn source(&self) -> &KeySourceClient {
        &self.source
    }

    /// Resolve a key ID, refreshing the set when needed.
    pub async fn get_key(&self, kid: &str) -> Result<Arc<VerificationKey>, KeyCacheError> {
        let observed = self.epoch.load(Ordering::Acquire);

        if let Some(key) = self.current.read().await.fresh_key(kid, Instant::now()) {
            return Ok(key);
        }

        debug!(kid = %kid, "Key cache miss");
        self.refresh_for(Some(kid), observed).await?;

        self.current
            .read()
            .await
            .fresh_key(kid, Instant::now())
            .ok_or_else(|| KeyCacheError::KeyNotFound(kid.to_string()))
    }

    /// Load the key set unless it is already fresh.
    pub async fn warm(&self) -> Result<(), KeyCacheError> {
        let observed = self.epoch.load(Ordering::Acquire);
        if self.is_fresh().await {
            return Ok(());
        }
        self.refresh_for(None, observed).await
    }

    /// Check if the key set is loaded and unexpired.
    pub async fn is_fresh(&self) -> bool {
        self.current.read().await.is_fresh(Instant::now())
    }

    /// Number of keys in the current set.
    pub async fn key_count(&self) -> usize {
        self.current.read().await.keys.len()
    }

    /// Run a refresh, or wait for the one already running.
    ///
    /// `observed` is the epoch the caller saw before it looked at the set. If
    /// the epoch has moved once the refresh lock is held, another caller's
    /// refresh completed in the meantime and its outcome is reused.
    async fn refresh_for(&self, kid: Option<&str>, observed: u64) -> Result<(), KeyCacheError> {
        let mut last_failure = self.refresh.lock().await;

        if self.epoch.load(Ordering::Acquire) != observed {
            let set = self.current.read().await;
            let now = Instant::now();
            let satisfied = match kid {
                Some(kid) => set.fresh_key(kid, now).is_some(),
                None => set.is_fresh(now),
            };
            if satisfied {
                return Ok(());
            }
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
            if set.is_fresh(now) {
                // Freshly refreshed and the key is still not there.
                return Ok(());
            }
        }

        let outcome = self.fetch_and_swap().await;
        *last_failure = outcome.as_ref().err().cloned();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn fetch_and_swap(&self) -> Result<(), KeyCacheError> {
        let records = self.source.fetch_keys().await.map_err(|e| {
            warn!(url = %self.source.jwks_url(), error = %e, "JWKS refresh failed");
            KeyCacheError::from(e)
        })?;

        if records.is_empty() {
            warn!(
                url = %self.source.jwks_url(),
                "JWKS contained no usable RSA signing keys, keeping previous key set"
            );
            return Err(KeyCacheError::EmptyKeySet);
        }

        let keys: HashMap<String, Arc<VerificationKey>> = records
            .into_iter()
            .map(|record| (record.kid.clone(), Arc::new(VerificationKey::from_record(record))))
            .collect();
        let key_count = keys.len();

        *self.current.write().await = KeySet {
            keys,
            expires_at: Some(Instant::now() + self.ttl),
        };

        info!(key_count, ttl_secs = self.ttl.as_secs(), "JWKS cache refreshed");
        Ok(())
    }
}
