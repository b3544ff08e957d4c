// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key cache with single-flight refresh.
//!
//! ## Behaviour
//!
//! - The key set is fetched on first use and cached for a TTL
//! - An expired set is refreshed; if the refresh fails the stale set is
//!   still served (availability over freshness)
//! - A token with an unknown `kid` may force one refresh, but not more often
//!   than the minimum refresh interval
//! - Only one fetch is ever in flight. It runs on its own task; callers await
//!   a shared handle, so a caller going away does not cancel it
//! - Consecutive fetch failures open an exponentially growing backoff window
//!   during which no new fetch is attempted

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::error::AuthError;
use super::jwks::{FetchKeySet, KeySet};

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum age of the cached set before an unknown `kid` may trigger a refresh.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<KeySet>, AuthError>>>;

/// Freshness of the cached key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Fresh,
    Stale,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Empty => "empty",
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
        }
    }
}

#[derive(Debug, Default)]
struct Backoff {
    failures: u32,
    retry_at: Option<Instant>,
}

impl Backoff {
    fn record_failure(&mut self, initial: Duration, max: Duration) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let exponent = self.failures.saturating_sub(1).min(16);
        let delay = initial.saturating_mul(1u32 << exponent).min(max);
        self.retry_at = Some(Instant::now() + delay);
        delay
    }

    fn reset(&mut self) {
        *self = Backoff::default();
    }

    fn remaining(&self) -> Option<Duration> {
        self.retry_at
            .and_then(|at| at.checked_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
    }
}

struct Inner {
    fetcher: Arc<dyn FetchKeySet>,
    ttl: Duration,
    min_refresh_interval: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
    current: RwLock<Option<Arc<KeySet>>>,
    in_flight: Mutex<Option<SharedFetch>>,
    backoff: Mutex<Backoff>,
    fetches: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn current(&self) -> Option<Arc<KeySet>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn fetch_and_store(self: Arc<Self>) -> Result<Arc<KeySet>, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let outcome = match self.fetcher.fetch().await {
            Ok(key_set) => {
                let key_set = Arc::new(key_set);
                *self.current.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::clone(&key_set));
                lock(&self.backoff).reset();
                tracing::info!(keys = key_set.len(), "JWKS cache updated");
                Ok(key_set)
            }
            Err(err) => {
                let delay =
                    lock(&self.backoff).record_failure(self.initial_backoff, self.max_backoff);
                tracing::error!(error = %err, retry_in = ?delay, "Failed to fetch JWKS");
                Err(err)
            }
        };

        // Cleared after the cache write so late arrivals see the new set.
        *lock(&self.in_flight) = None;
        outcome
    }
}

/// Cache of the provider's signing keys.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct KeySetCache {
    inner: Arc<Inner>,
}

impl KeySetCache {
    pub fn new(fetcher: Arc<dyn FetchKeySet>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                ttl: DEFAULT_CACHE_TTL,
                min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
                initial_backoff: DEFAULT_INITIAL_BACKOFF,
                max_backoff: DEFAULT_MAX_BACKOFF,
                current: RwLock::new(None),
                in_flight: Mutex::new(None),
                backoff: Mutex::new(Backoff::default()),
                fetches: AtomicU64::new(0),
            }),
        }
    }

    fn configure(mut self, apply: impl FnOnce(&mut Inner)) -> Self {
        // Builders run before the cache is shared, so the Arc is still unique.
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            apply(inner);
        }
        self
    }

    pub fn with_ttl(self, ttl: Duration) -> Self {
        self.configure(|inner| inner.ttl = ttl)
    }

    pub fn with_min_refresh_interval(self, interval: Duration) -> Self {
        self.configure(|inner| inner.min_refresh_interval = interval)
    }

    pub fn with_backoff(self, initial: Duration, max: Duration) -> Self {
        self.configure(|inner| {
            inner.initial_backoff = initial;
            inner.max_backoff = max;
        })
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Get the current key set, fetching it if the cache is empty or expired.
    ///
    /// # Errors
    /// [`AuthError::KeySourceUnavailable`] when no key set is cached and the
    /// fetch fails (or is suppressed by backoff).
    pub async fn get_keys(&self) -> Result<Arc<KeySet>, AuthError> {
        let cached = self.inner.current();
        if let Some(key_set) = &cached {
            if key_set.age() < self.inner.ttl {
                return Ok(Arc::clone(key_set));
            }
        }

        self.refresh_or_stale(cached).await
    }

    /// Refresh because a token referenced a `kid` the cached set lacks.
    ///
    /// Returns the cached set untouched when it is younger than the minimum
    /// refresh interval.
    pub async fn refresh_for_missing_key(&self) -> Result<Arc<KeySet>, AuthError> {
        let cached = self.inner.current();
        if let Some(key_set) = &cached {
            if key_set.age() < self.inner.min_refresh_interval {
                return Ok(Arc::clone(key_set));
            }
        }

        tracing::info!("Unknown key id, refreshing JWKS");
        self.refresh_or_stale(cached).await
    }

    async fn refresh_or_stale(
        &self,
        cached: Option<Arc<KeySet>>,
    ) -> Result<Arc<KeySet>, AuthError> {
        match self.refresh(cached.as_ref()).await {
            Ok(key_set) => Ok(key_set),
            Err(err) => match cached {
                Some(stale) => {
                    tracing::warn!(error = %err, age = ?stale.age(), "Serving stale JWKS");
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }

    /// Join the in-flight fetch or start one.
    ///
    /// `seen` is the set the caller already judged insufficient; if the cache
    /// has moved on since, the newer set is returned without fetching.
    async fn refresh(&self, seen: Option<&Arc<KeySet>>) -> Result<Arc<KeySet>, AuthError> {
        let fetch = {
            let mut slot = lock(&self.inner.in_flight);

            match slot.as_ref() {
                Some(fetch) => fetch.clone(),
                None => {
                    if let Some(current) = self.inner.current() {
                        if seen.map_or(true, |seen| !Arc::ptr_eq(seen, &current)) {
                            return Ok(current);
                        }
                    }

                    if let Some(remaining) = lock(&self.inner.backoff).remaining() {
                        return Err(AuthError::KeySourceUnavailable(format!(
                            "JWKS fetch suppressed for another {remaining:?} after failures"
                        )));
                    }

                    let task = tokio::spawn(Arc::clone(&self.inner).fetch_and_store());
                    let fetch: SharedFetch = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(AuthError::KeySourceUnavailable(format!(
                                "JWKS fetch task failed: {e}"
                            )))
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Freshness of the cached set, without fetching.
    pub fn status(&self) -> CacheStatus {
        match self.inner.current() {
            None => CacheStatus::Empty,
            Some(key_set) if key_set.age() < self.inner.ttl => CacheStatus::Fresh,
            Some(_) => CacheStatus::Stale,
        }
    }

    /// Number of fetch attempts made so far.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Number of keys currently cached.
    pub fn key_count(&self) -> usize {
        self.inner.current().map_or(0, |key_set| key_set.len())
    }
}
