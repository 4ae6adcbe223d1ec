// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Timeless API - authenticated HTTP service backed by an AWS Cognito user pool
//!
//! Access tokens issued by the pool are verified locally against the pool's
//! published signing keys. Keys are cached and refreshed on expiry or when a
//! token names a key the cache has not seen yet.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Key cache, token verification and the request gate
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
