// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and signing key conversion.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS only (plain HTTP only for loopback, see config)
//! - Each key carries its own verification algorithm, taken from the JWK
//!   (`alg`, or derived from the key type) and never from a token header
//! - Symmetric and encryption keys are ignored
//!
//! Caching lives in [`super::cache`]; this module performs exactly one request
//! per [`FetchKeySet::fetch`] call and never retries.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use url::Url;

use super::error::AuthError;

/// Default timeout for a single JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest JWKS response body accepted.
pub const MAX_JWKS_BYTES: usize = 256 * 1024;

/// A public key usable for signature verification.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    algorithm: Algorithm,
    key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Convert a JWK into a signing key.
    ///
    /// Returns a human-readable reason when the JWK is not usable.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, String> {
        let key_id = jwk
            .common
            .key_id
            .clone()
            .ok_or_else(|| "JWK has no kid".to_string())?;

        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            return Err(format!("key {key_id} is an encryption key"));
        }

        let declared = jwk.common.key_algorithm;
        let (key, algorithm) = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => {
                let algorithm = match declared {
                    None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
                    Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                    Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                    Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                    Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                    Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                    Some(other) => return Err(format!("key {key_id}: alg {other:?} does not fit RSA")),
                };
                let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                    .map_err(|e| format!("key {key_id}: bad RSA components: {e}"))?;
                (key, algorithm)
            }
            AlgorithmParameters::EllipticCurve(ec) => {
                let algorithm = match (&ec.curve, declared) {
                    (EllipticCurve::P256, None | Some(KeyAlgorithm::ES256)) => Algorithm::ES256,
                    (EllipticCurve::P384, None | Some(KeyAlgorithm::ES384)) => Algorithm::ES384,
                    (curve, alg) => {
                        return Err(format!("key {key_id}: unsupported curve/alg {curve:?}/{alg:?}"))
                    }
                };
                let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                    .map_err(|e| format!("key {key_id}: bad EC components: {e}"))?;
                (key, algorithm)
            }
            AlgorithmParameters::OctetKeyPair(okp) => {
                if !matches!(okp.curve, EllipticCurve::Ed25519)
                    || !matches!(declared, None | Some(KeyAlgorithm::EdDSA))
                {
                    return Err(format!("key {key_id}: unsupported OKP key"));
                }
                let key = DecodingKey::from_ed_components(&okp.x)
                    .map_err(|e| format!("key {key_id}: bad Ed25519 component: {e}"))?;
                (key, Algorithm::EdDSA)
            }
            AlgorithmParameters::OctetKey(_) => {
                return Err(format!("key {key_id}: symmetric keys are not accepted"))
            }
            #[allow(unreachable_patterns)]
            _ => return Err(format!("key {key_id}: unsupported key type")),
        };

        Ok(Self {
            key_id,
            algorithm,
            key,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm used to verify signatures made with this key.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

/// An immutable snapshot of the provider's signing keys.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<SigningKey>,
    fetched_at: DateTime<Utc>,
    fetched_instant: Instant,
}

impl KeySet {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self {
            keys,
            fetched_at: Utc::now(),
            fetched_instant: Instant::now(),
        }
    }

    /// Build a key set from raw JWK JSON values, skipping unusable entries.
    pub fn from_jwk_values(values: Vec<serde_json::Value>) -> Self {
        let keys = values
            .into_iter()
            .filter_map(|value| {
                let converted = serde_json::from_value::<Jwk>(value)
                    .map_err(|e| format!("unparseable JWK: {e}"))
                    .and_then(|jwk| SigningKey::from_jwk(&jwk));
                match converted {
                    Ok(key) => Some(key),
                    Err(reason) => {
                        tracing::warn!(%reason, "Skipping JWKS entry");
                        None
                    }
                }
            })
            .collect();
        Self::new(keys)
    }

    /// Linear scan for the key with the given id.
    pub fn find(&self, key_id: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.key_id == key_id)
    }

    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Time since this set was fetched.
    pub fn age(&self) -> Duration {
        self.fetched_instant.elapsed()
    }
}

/// Source of key sets.
///
/// One call is one attempt: implementations must not retry internally.
#[async_trait]
pub trait FetchKeySet: Send + Sync + 'static {
    async fn fetch(&self) -> Result<KeySet, AuthError>;
}

#[derive(Deserialize)]
struct RawJwks {
    keys: Vec<serde_json::Value>,
}

/// Fetches the key set from the provider's JWKS endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    jwks_url: Url,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Create a fetcher with the default request timeout.
    ///
    /// # Errors
    /// Returns [`AuthError::KeySourceUnavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn new(jwks_url: Url) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::KeySourceUnavailable(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(jwks_url, client))
    }

    pub fn with_client(jwks_url: Url, client: reqwest::Client) -> Self {
        Self { jwks_url, client }
    }

    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }
}

#[async_trait]
impl FetchKeySet for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<KeySet, AuthError> {
        tracing::info!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeySourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySourceUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let body = read_limited(response, MAX_JWKS_BYTES).await?;
        let raw: RawJwks = serde_json::from_slice(&body)
            .map_err(|e| AuthError::KeySourceUnavailable(format!("invalid JWKS payload: {e}")))?;

        let key_set = KeySet::from_jwk_values(raw.keys);
        if key_set.is_empty() {
            return Err(AuthError::KeySourceUnavailable(
                "JWKS contains no usable signing keys".to_string(),
            ));
        }

        tracing::info!(keys = key_set.len(), "JWKS fetched");
        Ok(key_set)
    }
}

/// Read the response body, giving up once it exceeds `limit` bytes.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>, AuthError> {
    let too_large = || AuthError::KeySourceUnavailable(format!("JWKS body exceeds {limit} bytes"));

    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AuthError::KeySourceUnavailable(e.to_string()))?
    {
        if body.len() + chunk.len() > limit {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
