//! Mailcow admin API client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::MailcowConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Mailcow answered 2xx but reported an error in its message list
    #[error("Mailcow rejected the request: {0}")]
    Rejected(String),

    #[error("invalid API URL: {0}")]
    Url(String),
}

/// Creates forwarding aliases.
#[async_trait]
pub trait AliasRegistry: Send + Sync {
    async fn create_alias(&self, address: &str, destination: &str) -> Result<(), RegistryError>;
}

#[derive(Debug, Serialize)]
struct AddAlias<'a> {
    address: &'a str,
    #[serde(rename = "goto")]
    destination: &'a str,
    active: &'a str,
}

/// The concrete implementation of `AliasRegistry`.
pub struct MailcowClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl MailcowClient {
    pub fn new(config: &MailcowConfig) -> Result<Self, RegistryError> {
        let base_url = Url::parse(&config.api_url).map_err(|e| RegistryError::Url(format!("{}: {e}", config.api_url)))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: ensure_slash(&base_url),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RegistryError> {
        self.base_url
            .join(path)
            .map_err(|e| RegistryError::Url(format!("failed to construct {path} URL: {e}")))
    }

    /// Verify the admin API is reachable and accepts the key.
    #[instrument(skip(self), fields(url = %self.base_url))]
    pub async fn check_connectivity(&self) -> Result<(), RegistryError> {
        let url = self.endpoint("api/v1/get/mailq/all")?;
        let started = Instant::now();
        let response = self.client.get(url).header("X-API-Key", &self.api_key).send().await?;
        debug!(elapsed = ?started.elapsed(), status = %response.status(), "Received API check response");

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Mailcow API check failed with status {status}: {body}");
            return Err(RegistryError::Status { status, body });
        }

        info!("Mailcow API connectivity check successful");
        Ok(())
    }
}

/// Makes sure a url has a trailing slash.
///
/// Joining '/hello' and 'world' gives '/world', but '/hello/' and 'world' gives '/hello/world'.
/// Call this before calling .join
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}

/// First `danger`/`error` entry of a Mailcow response list, rendered as text.
fn rejection(body: &Value) -> Option<String> {
    body.as_array()?
        .iter()
        .find(|entry| matches!(entry.get("type").and_then(Value::as_str), Some("danger" | "error")))
        .map(|entry| match entry.get("msg") {
            Some(Value::String(msg)) => msg.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .map(|part| part.as_str().map_or_else(|| part.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(" "),
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        })
}

#[async_trait]
impl AliasRegistry for MailcowClient {
    #[instrument(skip_all, fields(alias = %address))]
    async fn create_alias(&self, address: &str, destination: &str) -> Result<(), RegistryError> {
        let url = self.endpoint("api/v1/add/alias")?;
        let body = AddAlias {
            address,
            destination,
            active: "1",
        };

        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        debug!(elapsed = ?started.elapsed(), %status, "Received alias creation response");

        let text = response.text().await?;
        if !status.is_success() {
            error!("Mailcow alias creation failed with status {status}: {text}");
            return Err(RegistryError::Status { status, body: text });
        }

        // Mailcow reports most failures as 200 with a typed message list.
        let parsed = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        if let Some(message) = rejection(&parsed) {
            error!("Mailcow rejected alias: {message}");
            return Err(RegistryError::Rejected(message));
        }

        info!("Successfully created alias in Mailcow");
        Ok(())
    }
}

/// Install the process-wide rustls crypto provider used by reqwest and lettre.
///
/// Safe to call more than once.
pub fn install_crypto_provider() {
    // Err means a provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
