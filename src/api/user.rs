// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints shaped from the verified claims.

use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    auth::{Auth, ClaimSet},
    error::ApiError,
};

/// Registered claims left out of `token_claims`.
const HIDDEN_CLAIMS: &[&str] = &["iat", "exp", "nbf", "iss", "aud"];

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub session_id: Option<String>,
    /// All token claims except `iat`, `exp`, `nbf`, `iss` and `aud`.
    #[schema(value_type = Object)]
    pub token_claims: Map<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDataResponse {
    pub message: String,
    pub user_id: String,
    #[schema(value_type = Object)]
    pub updated_data: Map<String, Value>,
    /// Token `iat` of the request that made the update.
    pub timestamp: i64,
}

/// Claims as a JSON object, minus the registered timing/audience claims.
pub fn visible_claims(claims: &ClaimSet) -> Map<String, Value> {
    let mut map = match serde_json::to_value(claims) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for key in HIDDEN_CLAIMS {
        map.remove(*key);
    }
    map
}

/// Profile information from the token.
#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "User",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(Auth(claims): Auth) -> Json<ProfileResponse> {
    let token_claims = visible_claims(&claims);

    Json(ProfileResponse {
        user_id: claims.sub,
        email: claims.email,
        full_name: claims.name,
        session_id: claims.sid,
        token_claims,
    })
}

/// Accept user data for the authenticated user.
///
/// Nothing is persisted; the payload is echoed back.
#[utoipa::path(
    post,
    path = "/user/data",
    tag = "User",
    request_body(content = Object, description = "Arbitrary JSON object"),
    responses(
        (status = 200, description = "Data accepted", body = UserDataResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Body is not a JSON object")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_data(
    Auth(claims): Auth,
    Json(body): Json<Value>,
) -> Result<Json<UserDataResponse>, ApiError> {
    let Value::Object(updated_data) = body else {
        return Err(ApiError::InvalidBody("Request body must be a JSON object"));
    };

    tracing::info!(user_id = %claims.sub, fields = updated_data.len(), "User data received");

    Ok(Json(UserDataResponse {
        message: "User data updated successfully".to_string(),
        user_id: claims.sub,
        updated_data,
        timestamp: claims.iat,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visible_claims_drops_registered_timing_claims() {
        let claims: ClaimSet = serde_json::from_value(json!({
            "sub": "user_1",
            "iss": "https://issuer.test",
            "aud": "app",
            "iat": 10,
            "exp": 20,
            "nbf": 5,
            "email": "a@b.c",
            "azp": "http://localhost:3000",
        }))
        .unwrap();

        let visible = visible_claims(&claims);
        for hidden in HIDDEN_CLAIMS {
            assert!(!visible.contains_key(*hidden), "{hidden}");
        }
        assert_eq!(visible["sub"], "user_1");
        assert_eq!(visible["email"], "a@b.c");
        assert_eq!(visible["azp"], "http://localhost:3000");
    }
}
