// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clerk Auth Gateway - bearer token verification service
//!
//! This crate verifies JWTs issued by Clerk against the provider's published
//! JWKS and exposes the verified claims to request handlers.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - JWKS caching, token verification, middleware and extractors
//! - `config` - Environment-driven configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
