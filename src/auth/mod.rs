// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides Clerk JWT authentication for the gateway.
//!
//! ## Auth Flow
//!
//! 1. Frontend (Next.js) authenticates the user with Clerk
//! 2. Frontend sends `Authorization: Bearer <Clerk JWT>`
//! 3. Gateway:
//!    - Reads the `kid` from the (untrusted) token header
//!    - Resolves the signing key from the cached JWKS, fetching it if needed
//!    - Verifies signature, then issuer, audience, expiry and not-before
//!    - Hands the verified [`ClaimSet`] to the handler
//!
//! ## Security
//!
//! - The verification algorithm comes from the JWK, never from the token
//! - Clients only learn the outcome (401/403/503), never which check failed
//! - JWKS is cached with TTL, refreshed on unknown `kid` (rate limited), and
//!   fetched by at most one request at a time
//! - Clock skew tolerance defaults to 60 seconds

pub mod cache;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use cache::{CacheStatus, KeySetCache};
pub use claims::{Audience, ClaimSet};
pub use error::{AuthError, AuthOutcome};
pub use extractor::{authorize, AdminOnly, Auth};
pub use jwks::{FetchKeySet, HttpKeySetFetcher, KeySet, SigningKey};
pub use middleware::{bearer_token, require_auth};
pub use verifier::{TokenHeader, TokenVerifier};
