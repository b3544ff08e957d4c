// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified JWT claims.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claims decoded from a verified Clerk JWT.
///
/// Standard claims are typed fields; Clerk-specific claims the gateway knows
/// about (`email`, `name`, `sid`) are optional, and everything else lands in
/// `extra`. Only [`crate::auth::TokenVerifier`] produces a `ClaimSet`, after
/// signature, issuer, audience and validity window all passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject - the canonical Clerk user identifier
    pub sub: String,

    /// Issuer (Clerk instance URL)
    pub iss: String,

    /// Audience
    pub aud: Audience,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Expiration (Unix seconds)
    pub exp: i64,

    /// Not before (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Clerk session ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Provider-specific claims not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The `aud` claim, which may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

impl ClaimSet {
    /// True when the `email` claim is present and ends with `suffix`.
    pub fn email_ends_with(&self, suffix: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| email.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> ClaimSet {
        serde_json::from_value(json!({
            "sub": "user_123",
            "iss": "https://clerk.example.com",
            "aud": "my-app",
            "iat": 1700000000,
            "exp": 1700003600,
            "email": "jane@admin.com",
            "sid": "sess_abc",
            "azp": "http://localhost:3000",
        }))
        .unwrap()
    }

    #[test]
    fn unknown_claims_land_in_extra() {
        let claims = sample_claims();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.sid.as_deref(), Some("sess_abc"));
        assert_eq!(claims.extra.get("azp"), Some(&json!("http://localhost:3000")));
        assert!(claims.nbf.is_none());
    }

    #[test]
    fn audience_accepts_string_or_list() {
        let single: Audience = serde_json::from_value(json!("a")).unwrap();
        let many: Audience = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert!(single.contains("a"));
        assert!(!single.contains("b"));
        assert!(many.contains("b"));
        assert!(!many.contains("c"));
    }

    #[test]
    fn serialization_omits_absent_optionals() {
        let value = serde_json::to_value(sample_claims()).unwrap();
        assert!(value.get("nbf").is_none());
        assert!(value.get("name").is_none());
        assert_eq!(value["azp"], "http://localhost:3000");
    }

    #[test]
    fn email_suffix_check() {
        let mut claims = sample_claims();
        assert!(claims.email_ends_with("@admin.com"));
        assert!(claims.email_ends_with("@ADMIN.com"));
        assert!(!claims.email_ends_with("@example.com"));

        claims.email = None;
        assert!(!claims.email_ends_with("@admin.com"));
    }
}
