// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::Auth;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProtectedResponse {
    pub message: String,
    pub user_id: String,
    pub user_email: Option<String>,
    /// Token `iat` (Unix seconds).
    pub issued_at: i64,
    /// Token `exp` (Unix seconds).
    pub expires_at: i64,
    pub auth: String,
}

/// Protected endpoint - requires a valid token.
#[utoipa::path(
    get,
    path = "/protected",
    tag = "Protected",
    responses(
        (status = 200, description = "Access granted", body = ProtectedResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 503, description = "Signing keys unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn protected(Auth(claims): Auth) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "Access granted to protected resource".to_string(),
        user_id: claims.sub,
        user_email: claims.email,
        issued_at: claims.iat,
        expires_at: claims.exp,
        auth: "required".to_string(),
    })
}
