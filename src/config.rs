// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `COGNITO_REGION` | User pool region | `ap-northeast-1` |
//! | `COGNITO_USER_POOL_ID` | User pool ID | Required for auth |
//! | `COGNITO_CLIENT_ID` | App client ID expected in `client_id` | Required for auth |
//! | `COGNITO_ENDPOINT` | Issuer base URL override (local emulators) | Derived from region |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime | `3600` |
//! | `SHUTDOWN_GRACE_SECS` | Time allowed for in-flight requests on shutdown | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! A missing pool or client ID is not an error: the server starts, health
//! checks pass and every authenticated request is rejected.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const COGNITO_REGION_ENV: &str = "COGNITO_REGION";
pub const COGNITO_USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";
pub const COGNITO_CLIENT_ID_ENV: &str = "COGNITO_CLIENT_ID";
pub const COGNITO_ENDPOINT_ENV: &str = "COGNITO_ENDPOINT";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const SHUTDOWN_GRACE_ENV: &str = "SHUTDOWN_GRACE_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REGION: &str = "ap-northeast-1";
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("COGNITO_ENDPOINT is not a valid http(s) URL: {value:?}")]
    InvalidEndpoint { value: String },
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything other than `json` means pretty.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Cognito user pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Replaces `https://cognito-idp.<region>.amazonaws.com` when set.
    pub endpoint: Option<Url>,
}

impl CognitoConfig {
    /// Base URL of the issuing authority, without a trailing slash.
    pub fn authority(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.as_str().trim_end_matches('/').to_string(),
            None => format!("https://cognito-idp.{}.amazonaws.com", self.region),
        }
    }

    /// Expected `iss` claim.
    pub fn issuer(&self) -> String {
        format!("{}/{}", self.authority(), self.user_pool_id)
    }

    /// User pool JWKS endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }

    /// Whether both the pool and the client are configured.
    pub fn is_complete(&self) -> bool {
        !self.user_pool_id.is_empty() && !self.client_id.is_empty()
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cognito: CognitoConfig,
    pub jwks_cache_ttl: Duration,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get(PORT_ENV) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let endpoint = get(COGNITO_ENDPOINT_ENV)
            .map(|value| match Url::parse(value.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
                _ => Err(ConfigError::InvalidEndpoint { value }),
            })
            .transpose()?;

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cognito: CognitoConfig {
                region: get(COGNITO_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
                user_pool_id: get(COGNITO_USER_POOL_ID_ENV).unwrap_or_default(),
                client_id: get(COGNITO_CLIENT_ID_ENV).unwrap_or_default(),
                endpoint,
            },
            jwks_cache_ttl: seconds(&get, JWKS_CACHE_TTL_ENV, DEFAULT_JWKS_CACHE_TTL_SECS)?,
            shutdown_grace: seconds(&get, SHUTDOWN_GRACE_ENV, DEFAULT_SHUTDOWN_GRACE_SECS)?,
        })
    }

    /// Socket address to listen on.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr).map_err(|_| ConfigError::InvalidBindAddress(addr))
    }
}

fn seconds<G>(get: &G, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(Duration::from_secs(default)),
    }
}
