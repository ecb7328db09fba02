//! Mailbox credential verification.
//!
//! Callers authenticate with their Mailcow mailbox address and password. The bridge has no user
//! store of its own: credentials are checked by logging in to the mail server over IMAPS or SMTPS
//! (see [`imap`] and [`smtp`]) and successful checks are remembered for a while in a
//! [`CredentialCache`] so that bursts of alias requests do not each cost a login round-trip.
//!
//! # Modules
//!
//! - [`cache`]: TTL cache of successful logins
//! - [`imap`]: `LOGIN`/`LOGOUT` against an IMAPS endpoint
//! - [`smtp`]: `AUTH` against an SMTPS endpoint

pub mod cache;
pub mod imap;
pub mod smtp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

pub use cache::{CacheStats, CredentialCache};

use crate::config::{AuthMethod, MailcowConfig};

#[derive(Debug, Error)]
pub enum AuthError {
    /// The server answered and refused the credentials
    #[error("{method} login rejected: {message}")]
    Rejected { method: AuthMethod, message: String },

    #[error("failed to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid server address format: {0}")]
    InvalidServerAddress(String),

    #[error("TLS error: {0}")]
    Tls(String),

    /// The server said something the client did not expect
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Checks a username/password pair against a remote mail server.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError>;

    fn method(&self) -> AuthMethod;
}

/// Build the verifier for the configured protocol.
pub fn create_verifier(config: &MailcowConfig) -> Result<Arc<dyn CredentialVerifier>, AuthError> {
    let (host, port) = config
        .server_host_port()
        .ok_or_else(|| AuthError::InvalidServerAddress(config.server_address.clone()))?;

    let verifier: Arc<dyn CredentialVerifier> = match config.auth_method {
        AuthMethod::Imap => Arc::new(imap::ImapVerifier::new(host, port, config.request_timeout)?),
        AuthMethod::Smtp => Arc::new(smtp::SmtpVerifier::new(host, port, config.request_timeout)),
    };
    Ok(verifier)
}

/// Cache-checked front of a [`CredentialVerifier`].
pub struct Authenticator {
    verifier: Arc<dyn CredentialVerifier>,
    cache: CredentialCache,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, cache_ttl: Duration) -> Self {
        Self {
            verifier,
            cache: CredentialCache::new(cache_ttl),
        }
    }

    /// Verify the credentials, answering from the cache while a previous success is still valid.
    /// Failures are never cached.
    #[instrument(skip_all, fields(user = %mask_username(username), method = %self.verifier.method()))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let key = credential_key(username, password);

        if let Some(expiry) = self.cache.expiry(&key) {
            if Instant::now() < expiry {
                debug!(remaining = ?expiry.saturating_duration_since(Instant::now()), "Using cached authentication");
                return Ok(());
            }
            debug!("Cached authentication has expired, re-authenticating");
        }

        let started = Instant::now();
        if let Err(e) = self.verifier.verify(username, password).await {
            warn!(elapsed = ?started.elapsed(), "Authentication failed: {e}");
            return Err(e);
        }

        if self.cache.insert(key).is_some() {
            debug!(ttl = ?self.cache.ttl(), "Cached authentication");
        }
        info!(elapsed = ?started.elapsed(), "Authentication successful");
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cleanup_cache(&self) -> usize {
        self.cache.cleanup()
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }
}

/// Username as it may appear in logs: the first three characters followed by `***`.
pub fn mask_username(username: &str) -> String {
    match username.char_indices().nth(3) {
        Some((cut, _)) => format!("{}***", &username[..cut]),
        None => username.to_string(),
    }
}

/// Hex SHA-256 of `username:password`, so the cache never holds passwords.
pub fn credential_key(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
