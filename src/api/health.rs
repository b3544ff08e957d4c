// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Public banner response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    /// Always "not_required" for this endpoint.
    pub auth: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub auth_provider: String,
    /// JWKS cache state ("empty", "fresh" or "stale").
    pub jwks: String,
    /// Number of signing keys currently cached.
    pub jwks_keys: usize,
}

/// Public root endpoint.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service banner", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Secured API with Clerk Authentication".to_string(),
        status: "running".to_string(),
        auth: "not_required".to_string(),
    })
}

/// Health check endpoint handler.
///
/// Reports the JWKS cache state without triggering a fetch; a cold cache is
/// not a failure, the first authenticated request populates it.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.verifier.cache();

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        auth_provider: "clerk".to_string(),
        jwks: cache.status().as_str().to_string(),
        jwks_keys: cache.key_count(),
    })
}
