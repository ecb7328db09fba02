//! Time-bounded memory of successful logins.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held, expired or not
    pub total: usize,
    /// Entries that would still be honoured
    pub valid: usize,
}

/// Credential key → expiry. A zero TTL turns every operation into a no-op.
#[derive(Debug)]
pub struct CredentialCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Instant>>,
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expiry of `key` if present, expired or not.
    pub fn expiry(&self, key: &str) -> Option<Instant> {
        if !self.is_enabled() {
            return None;
        }
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Whether `key` has an unexpired entry.
    pub fn is_valid(&self, key: &str) -> bool {
        self.expiry(key).is_some_and(|expiry| Instant::now() < expiry)
    }

    /// Record a successful login, replacing any previous expiry.
    pub fn insert(&self, key: String) -> Option<Instant> {
        if !self.is_enabled() {
            return None;
        }
        let expiry = Instant::now() + self.ttl;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, expiry);
        Some(expiry)
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            total: entries.len(),
            valid: entries.values().filter(|&&expiry| now < expiry).count(),
        }
    }

    /// Drop expired entries, returning how many were removed.
    pub fn cleanup(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, expiry| now < *expiry);
        before - entries.len()
    }
}
