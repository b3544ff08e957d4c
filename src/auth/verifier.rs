// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT verification against the cached JWKS.
//!
//! The token header is read without trust and only used to pick a key by
//! `kid`. The verification algorithm always comes from the matched key, so a
//! token cannot choose how it is checked. The signature is checked before any
//! claim.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::cache::KeySetCache;
use super::claims::ClaimSet;
use super::error::AuthError;
use super::jwks::{HttpKeySetFetcher, SigningKey};
use crate::config::{AuthSettings, DEFAULT_LEEWAY_SECS};

/// Claims every accepted token must carry.
const REQUIRED_CLAIMS: &[&str] = &["sub", "iss", "aud", "exp"];

/// The untrusted token header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub key_id: String,
    pub algorithm: Algorithm,
}

impl TokenHeader {
    /// Split the token into its three segments and decode the header.
    ///
    /// # Errors
    /// [`AuthError::MalformedToken`] if the token does not have three
    /// base64url segments, the payload is not a JSON object, or the header
    /// has no `kid`.
    pub fn parse(token: &str) -> Result<Self, AuthError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, signature] = segments.as_slice() else {
            return Err(AuthError::MalformedToken);
        };

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&payload)
            .map_err(|_| AuthError::MalformedToken)?;
        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let key_id = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MalformedToken)?;

        Ok(Self {
            key_id,
            algorithm: header.alg,
        })
    }
}

/// Verifies bearer tokens and produces [`ClaimSet`]s.
#[derive(Clone)]
pub struct TokenVerifier {
    cache: KeySetCache,
    issuer: String,
    audience: String,
    leeway_secs: u64,
}

impl TokenVerifier {
    pub fn new(cache: KeySetCache, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            cache,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Build a verifier fetching keys over HTTP as configured.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AuthError> {
        let fetcher = HttpKeySetFetcher::new(settings.jwks_url.clone())?;
        let cache = KeySetCache::new(Arc::new(fetcher)).with_ttl(settings.cache_ttl);
        Ok(Self::new(cache, &settings.issuer, &settings.audience).with_leeway(settings.leeway_secs))
    }

    /// Clock skew tolerance applied to `exp` and `nbf`.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    pub fn cache(&self) -> &KeySetCache {
        &self.cache
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify a bearer token.
    ///
    /// # Errors
    /// One of `MalformedToken`, `KeyNotFound`, `KeySourceUnavailable`,
    /// `SignatureInvalid` or `ClaimInvalid`. No partial claims are returned.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let result = self.verify_token(token).await;
        match &result {
            Ok(claims) => tracing::info!(user_id = %claims.sub, "Token verified"),
            Err(err) => tracing::warn!(reason = err.kind(), error = %err, "Token verification failed"),
        }
        result
    }

    async fn verify_token(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let header = TokenHeader::parse(token)?;

        let mut keys = self.cache.get_keys().await?;
        if keys.find(&header.key_id).is_none() {
            keys = self.cache.refresh_for_missing_key().await?;
        }
        let key = keys.find(&header.key_id).ok_or(AuthError::KeyNotFound)?;

        if header.algorithm != key.algorithm() {
            tracing::debug!(
                kid = %header.key_id,
                token_alg = ?header.algorithm,
                key_alg = ?key.algorithm(),
                "Token algorithm differs from key algorithm"
            );
        }

        self.validate(token, key)
    }

    fn validate(&self, token: &str, key: &SigningKey) -> Result<ClaimSet, AuthError> {
        let mut validation = Validation::new(key.algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(REQUIRED_CLAIMS);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.leeway_secs;

        decode::<ClaimSet>(token, key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }
}

/// Map a `jsonwebtoken` failure onto the verification taxonomy.
///
/// The segments were already checked by [`TokenHeader::parse`], so anything
/// that is not a claim check failed during signature verification.
fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::ClaimInvalid("token expired".to_string()),
        ErrorKind::ImmatureSignature => AuthError::ClaimInvalid("token not yet valid".to_string()),
        ErrorKind::InvalidIssuer => AuthError::ClaimInvalid("issuer mismatch".to_string()),
        ErrorKind::InvalidAudience => AuthError::ClaimInvalid("audience mismatch".to_string()),
        ErrorKind::InvalidSubject => AuthError::ClaimInvalid("subject mismatch".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::ClaimInvalid(format!("missing required claim {claim}"))
        }
        ErrorKind::InvalidClaimFormat(claim) => {
            AuthError::ClaimInvalid(format!("invalid claim format {claim}"))
        }
        // Decoding into ClaimSet only happens after the signature passed.
        ErrorKind::Json(e) => AuthError::ClaimInvalid(format!("unexpected claim shape: {e}")),
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingAlgorithm
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidEddsaKey
        | ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_) => AuthError::SignatureInvalid,
        other => {
            tracing::warn!(kind = ?other, "Unclassified JWT error, rejecting as invalid signature");
            AuthError::SignatureInvalid
        }
    }
}
