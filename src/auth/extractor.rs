// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims is the verified ClaimSet
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::bearer_token;
use super::{AuthError, ClaimSet};
use crate::state::AppState;

/// Extractor for verified claims.
///
/// Uses the claims inserted by [`super::middleware::require_auth`] when the
/// route sits behind it, and verifies the `Authorization` header itself
/// otherwise.
pub struct Auth(pub ClaimSet);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already verified the token
        if let Some(claims) = parts.extensions.get::<ClaimSet>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.verifier.verify(token).await?;
        parts.extensions.insert(claims.clone());

        Ok(Auth(claims))
    }
}

/// Check an authenticated request against a caller-supplied predicate.
///
/// # Errors
/// [`AuthError::Forbidden`] if the predicate rejects the claims.
pub fn authorize<F>(claims: &ClaimSet, predicate: F) -> Result<(), AuthError>
where
    F: FnOnce(&ClaimSet) -> bool,
{
    if predicate(claims) {
        Ok(())
    } else {
        tracing::warn!(user_id = %claims.sub, "Authorization check failed");
        Err(AuthError::Forbidden)
    }
}

/// Extractor that requires the `email` claim to end with the configured
/// admin suffix.
pub struct AdminOnly(pub ClaimSet);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(claims) = Auth::from_request_parts(parts, state).await?;
        authorize(&claims, |c| c.email_ends_with(&state.admin_email_suffix))?;
        Ok(AdminOnly(claims))
    }
}
