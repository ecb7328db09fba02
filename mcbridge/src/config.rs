//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `MCBRIDGE_CONFIG`
//! environment variable. The file is optional; a deployment configured purely from the
//! environment works as well.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `MCBRIDGE_` override YAML values
//! 3. **Bridge variables** - The plain variable names used by existing bridge deployments
//!    (`PORT`, `MAILCOW_ADMIN_API_URL`, `ALIAS_GENERATION_PATTERN`, ...), see [`LEGACY_ENV`]
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `MCBRIDGE_MAILCOW__AUTH_METHOD=smtp` sets the `mailcow.auth_method` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! MCBRIDGE_PORT=9000
//! MCBRIDGE_MAILCOW__API_URL="https://mail.example.com"
//! MCBRIDGE_AUTH_CACHE__TTL=10m
//!
//! # Equivalent bridge-style variables
//! MAILCOW_ADMIN_API_URL="https://mail.example.com"
//! AUTH_CACHE_TTL=600
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use url::Url;

use crate::alias::AliasTemplate;
use crate::errors::Error;

/// Plain environment variables accepted for compatibility, and the config key each one sets.
pub const LEGACY_ENV: &[(&str, &str)] = &[
    ("PORT", "port"),
    ("LOG_LEVEL", "log_level"),
    ("LOG_COLOR", "log_color"),
    ("MAILCOW_ADMIN_API_URL", "mailcow.api_url"),
    ("MAILCOW_ADMIN_API_KEY", "mailcow.api_key"),
    ("MAILCOW_AUTH_METHOD", "mailcow.auth_method"),
    ("MAILCOW_SERVER_ADDRESS", "mailcow.server_address"),
    ("ALIAS_VALIDITY_PERIOD", "alias.validity_years"),
    ("ALIAS_GENERATION_PATTERN", "alias.pattern"),
    ("AUTH_CACHE_TTL", "auth_cache_ttl_seconds"),
    ("CORS_ALLOW_ORIGIN", "cors.allow_origin"),
];

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MCBRIDGE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
    /// ANSI colours in console output
    pub log_color: bool,
    /// Export traces over OTLP (configured through the standard `OTEL_*` variables)
    pub enable_otel_export: bool,
    pub mailcow: MailcowConfig,
    pub alias: AliasConfig,
    pub auth_cache: AuthCacheConfig,
    pub cors: CorsConfig,
    /// Cache TTL in whole seconds, as given by `AUTH_CACHE_TTL`. Folded into `auth_cache.ttl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_cache_ttl_seconds: Option<u64>,
}

/// Mailcow admin API and mail protocol endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailcowConfig {
    /// Base URL of the Mailcow installation, e.g. `https://mail.example.com`
    pub api_url: String,
    /// Admin API key with write access
    pub api_key: String,
    /// Protocol used to check mailbox credentials
    pub auth_method: AuthMethod,
    /// `host:port` of the IMAPS or SMTPS endpoint
    pub server_address: String,
    /// Timeout for admin API calls and credential checks
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    #[serde(alias = "IMAP", alias = "Imap")]
    Imap,
    #[serde(alias = "SMTP", alias = "Smtp")]
    Smtp,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imap => f.write_str("IMAP"),
            Self::Smtp => f.write_str("SMTP"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasConfig {
    /// Template used for every generated alias
    pub pattern: String,
    /// Years until a generated alias is reported as expiring
    pub validity_years: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthCacheConfig {
    /// How long a successful login is remembered. Zero disables the cache.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Interval of the background sweep that drops expired entries
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Single allowed origin, or `*`. No CORS headers are sent when unset.
    pub allow_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_color: true,
            enable_otel_export: false,
            mailcow: MailcowConfig::default(),
            alias: AliasConfig::default(),
            auth_cache: AuthCacheConfig::default(),
            cors: CorsConfig::default(),
            auth_cache_ttl_seconds: None,
        }
    }
}

impl Default for MailcowConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            auth_method: AuthMethod::Imap,
            server_address: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            pattern: "{firstname}.{lastname}@%d".to_string(),
            validity_years: 10,
        }
    }
}

impl Default for AuthCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(10),
        }
    }
}

impl MailcowConfig {
    /// Split `server_address` into host and port, stripping IPv6 brackets.
    pub fn server_host_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.server_address.rsplit_once(':')?;
        let host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
        let port = port.parse().ok()?;
        (!host.is_empty()).then_some((host, port))
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(seconds) = config.auth_cache_ttl_seconds.take() {
            config.auth_cache.ttl = Duration::from_secs(seconds);
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Error::Internal {
            operation: format!("Config validation: {message}"),
        };

        if self.mailcow.api_url.is_empty() {
            return Err(invalid(
                "mailcow.api_url is not set. Set MAILCOW_ADMIN_API_URL or MCBRIDGE_MAILCOW__API_URL.".to_string(),
            ));
        }
        if let Err(e) = Url::parse(&self.mailcow.api_url) {
            return Err(invalid(format!("mailcow.api_url '{}' is not a valid URL: {e}", self.mailcow.api_url)));
        }
        if self.mailcow.api_key.is_empty() {
            return Err(invalid(
                "mailcow.api_key is not set. Set MAILCOW_ADMIN_API_KEY or MCBRIDGE_MAILCOW__API_KEY.".to_string(),
            ));
        }
        if self.mailcow.server_address.is_empty() {
            return Err(invalid(
                "mailcow.server_address is not set. Set MAILCOW_SERVER_ADDRESS or MCBRIDGE_MAILCOW__SERVER_ADDRESS."
                    .to_string(),
            ));
        }
        if self.mailcow.server_host_port().is_none() {
            return Err(invalid(format!(
                "mailcow.server_address '{}' must have the form host:port",
                self.mailcow.server_address
            )));
        }
        if let Err(e) = AliasTemplate::parse(self.alias.pattern.as_str()) {
            return Err(invalid(format!("alias.pattern is unusable: {e}")));
        }
        if self.auth_cache.cleanup_interval.is_zero() {
            return Err(invalid("auth_cache.cleanup_interval must be greater than zero".to_string()));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override specific values
            .merge(Env::prefixed("MCBRIDGE_").ignore(&["config"]).split("__"))
            // Variable names of existing bridge deployments
            .merge(
                Env::raw()
                    .only(&LEGACY_ENV.iter().map(|(env, _)| *env).collect::<Vec<_>>())
                    .map(|key| legacy_key(key.as_str()).into()),
            )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn legacy_key(env: &str) -> &'static str {
    LEGACY_ENV
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(env))
        .map_or("", |(_, key)| *key)
}
