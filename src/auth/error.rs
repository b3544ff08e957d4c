// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant maps to one of three outcomes at the HTTP boundary
//! (unauthenticated, forbidden, service unavailable). The response body only
//! carries the outcome and a static message; the variant and any detail
//! string are for logs.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization header absent or not `Bearer <token>`
    #[error("authorization header is missing or malformed")]
    Unauthenticated,
    /// Token cannot be split or decoded, or header lacks `kid`
    #[error("token is malformed")]
    MalformedToken,
    /// No signing key with the token's `kid`
    #[error("no signing key matches the token key id")]
    KeyNotFound,
    /// JWKS endpoint unreachable, failing or returning garbage
    #[error("signing keys unavailable: {0}")]
    KeySourceUnavailable(String),
    /// Signature does not verify against the resolved key
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// Signature valid but issuer, audience or validity window rejected
    #[error("token claims rejected: {0}")]
    ClaimInvalid(String),
    /// Authenticated but the authorization predicate failed
    #[error("insufficient permissions")]
    Forbidden,
}

/// What the caller is told about an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Unauthenticated,
    Forbidden,
    ServiceUnavailable,
}

impl AuthOutcome {
    pub fn status_code(self) -> StatusCode {
        match self {
            AuthOutcome::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthOutcome::Forbidden => StatusCode::FORBIDDEN,
            AuthOutcome::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(self) -> &'static str {
        match self {
            AuthOutcome::Unauthenticated => "unauthenticated",
            AuthOutcome::Forbidden => "forbidden",
            AuthOutcome::ServiceUnavailable => "service_unavailable",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            AuthOutcome::Unauthenticated => "Invalid or missing authentication credentials",
            AuthOutcome::Forbidden => "Insufficient permissions for this resource",
            AuthOutcome::ServiceUnavailable => "Authentication service temporarily unavailable",
        }
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl AuthError {
    /// Collapse the error into the outcome exposed to clients.
    pub fn outcome(&self) -> AuthOutcome {
        match self {
            AuthError::Unauthenticated
            | AuthError::MalformedToken
            | AuthError::KeyNotFound
            | AuthError::SignatureInvalid
            | AuthError::ClaimInvalid(_) => AuthOutcome::Unauthenticated,
            AuthError::Forbidden => AuthOutcome::Forbidden,
            AuthError::KeySourceUnavailable(_) => AuthOutcome::ServiceUnavailable,
        }
    }

    /// Short stable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::MalformedToken => "malformed_token",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeySourceUnavailable(_) => "key_source_unavailable",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::ClaimInvalid(_) => "claim_invalid",
            AuthError::Forbidden => "forbidden",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let outcome = self.outcome();
        let body = Json(AuthErrorBody {
            error: outcome.message(),
            error_code: outcome.error_code(),
        });
        let mut response = (outcome.status_code(), body).into_response();
        if outcome == AuthOutcome::Unauthenticated {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
