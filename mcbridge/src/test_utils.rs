//! Test doubles for the mail server and Mailcow collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;

use crate::auth::{AuthError, CredentialVerifier};
use crate::config::{AliasConfig, AuthMethod, Config, MailcowConfig};
use crate::mailcow::{AliasRegistry, RegistryError};
use crate::{Application, BackgroundServices};

/// Verifier that accepts or refuses everything and counts how often it was asked.
#[derive(Debug, Default)]
pub struct MockVerifier {
    accept: bool,
    calls: AtomicUsize,
}

impl MockVerifier {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            ..Default::default()
        }
    }

    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify(&self, _username: &str, _password: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            Ok(())
        } else {
            Err(AuthError::Rejected {
                method: AuthMethod::Imap,
                message: "NO [AUTHENTICATIONFAILED] Authentication failed.".to_string(),
            })
        }
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::Imap
    }
}

/// Registry that records `(alias, destination)` pairs, optionally failing every call.
#[derive(Debug, Default)]
pub struct MockRegistry {
    failure: Option<String>,
    created: Mutex<Vec<(String, String)>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call answers `RegistryError::Rejected(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl AliasRegistry for MockRegistry {
    async fn create_alias(&self, address: &str, destination: &str) -> Result<(), RegistryError> {
        if let Some(message) = &self.failure {
            return Err(RegistryError::Rejected(message.clone()));
        }
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((address.to_string(), destination.to_string()));
        Ok(())
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        mailcow: MailcowConfig {
            api_url: "http://localhost:8081".to_string(),
            api_key: "test-key".to_string(),
            server_address: "mail.example.com:993".to_string(),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        },
        alias: AliasConfig::default(),
        ..Default::default()
    }
}

/// Application over the given collaborators, wrapped in a test server.
pub fn create_test_app(
    config: Config,
    verifier: Arc<dyn CredentialVerifier>,
    registry: Arc<dyn AliasRegistry>,
) -> (TestServer, BackgroundServices) {
    Application::from_collaborators(config, verifier, registry)
        .expect("Failed to create application")
        .into_test_server()
}
