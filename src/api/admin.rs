// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! Access requires an `email` claim ending with the configured admin suffix.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AdminOnly;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserItem {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUsersResponse {
    pub message: String,
    pub users: Vec<AdminUserItem>,
    /// Subject of the admin making the request.
    pub admin_user: String,
}

/// List users (static sample data).
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "Admin access granted", body = AdminUsersResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(AdminOnly(claims): AdminOnly) -> Json<AdminUsersResponse> {
    tracing::info!(admin = %claims.sub, "Admin user listing");

    Json(AdminUsersResponse {
        message: "Admin access granted".to_string(),
        users: vec![
            AdminUserItem {
                id: "user_1".to_string(),
                email: "user1@example.com".to_string(),
            },
            AdminUserItem {
                id: "user_2".to_string(),
                email: "user2@example.com".to_string(),
            },
        ],
        admin_user: claims.sub,
    })
}
