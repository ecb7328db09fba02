//! # mcbridge: SimpleLogin-compatible aliases for Mailcow
//!
//! Password managers such as Bitwarden can create "random aliases" through SimpleLogin's API.
//! `mcbridge` speaks the relevant part of that API and creates the aliases in a self-hosted
//! [Mailcow](https://mailcow.email) instance instead, forwarding to the caller's own mailbox.
//!
//! ## Request flow
//!
//! A client calls `POST /api/alias/random/new` with an `Authentication: address:password` header.
//!
//! 1. The credentials are checked by logging in to the Mailcow mail server over IMAPS or SMTPS
//!    ([`auth`]). Successful logins are remembered for a configurable time so that a burst of
//!    requests costs a single login.
//! 2. An alias is generated from the configured pattern ([`alias`]), for example
//!    `{firstname}.{lastname}@%d`, where `%d` is the caller's domain.
//! 3. The alias is registered through the Mailcow admin API ([`mailcow`]) as a forward to the
//!    caller's address.
//! 4. The alias is returned together with an informational expiration date.
//!
//! ## Configuration
//!
//! See the [`config`] module. Deployments of the earlier bridge can keep their environment
//! variables (`MAILCOW_ADMIN_API_URL`, `MAILCOW_SERVER_ADDRESS`, ...).

pub mod alias;
pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod mailcow;
mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use bon::Builder;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::alias::AliasTemplate;
use crate::auth::{Authenticator, CredentialVerifier};
use crate::mailcow::{AliasRegistry, MailcowClient};
use crate::openapi::ApiDoc;
pub use config::Config;

/// Shared state handed to every request handler.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .authenticator(Arc::new(authenticator))
///     .registry(Arc::new(mailcow_client))
///     .template(Arc::new(template))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub authenticator: Arc<Authenticator>,
    pub registry: Arc<dyn AliasRegistry>,
    /// Parsed once at startup from `alias.pattern`
    pub template: Arc<AliasTemplate>,
}

/// CORS layer for `cors.allow_origin`, if one is configured.
fn create_cors_layer(config: &Config) -> anyhow::Result<Option<CorsLayer>> {
    let Some(origin) = config.cors.allow_origin.as_deref() else {
        return Ok(None);
    };

    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{origin}'"))?,
        )
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                HeaderName::from_static("authentication"),
            ]),
    ))
}

/// Build the router: alias and health routes, OpenAPI docs, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let mut router = Router::new()
        .route(
            "/api/alias/random/new",
            post(api::handlers::aliases::create_random_alias),
        )
        .route("/healthz", get(api::handlers::health::healthz))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let Some(cors_layer) = cors_layer {
        router = router.layer(cors_layer);
    }

    // DefaultMakeSpan leaves headers out, so the Authentication header never reaches the logs.
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Tasks running next to the HTTP server. Dropping this cancels them.
pub struct BackgroundServices {
    background_tasks: Vec<JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<DropGuard>,
}

impl BackgroundServices {
    fn start(authenticator: &Arc<Authenticator>, cleanup_interval: Duration) -> Self {
        let shutdown_token = CancellationToken::new();
        let drop_guard = shutdown_token.clone().drop_guard();

        let background_tasks = spawn_cache_sweeper(authenticator.clone(), cleanup_interval, shutdown_token.clone())
            .into_iter()
            .collect();

        Self {
            background_tasks,
            shutdown_token,
            drop_guard: Some(drop_guard),
        }
    }

    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// Periodically drop expired logins from the credential cache. Nothing is spawned when caching
/// is disabled.
fn spawn_cache_sweeper(
    authenticator: Arc<Authenticator>,
    interval: Duration,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    if !authenticator.is_cache_enabled() {
        info!("Auth caching disabled");
        return None;
    }
    info!(?interval, "Auth cache cleanup initialized");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let stats = authenticator.cache_stats();
                    if stats.total == 0 {
                        continue;
                    }
                    let removed = authenticator.cleanup_cache();
                    if removed > 0 {
                        info!(total = stats.total, valid = stats.valid, removed, "Auth cache cleaned");
                    }
                }
            }
        }
        debug!("Auth cache sweeper stopped");
    }))
}

/// The running service.
///
/// 1. **Create**: [`Application::new`] builds the credential verifier, checks that the Mailcow
///    API answers, parses the alias pattern and starts the cache sweeper
/// 2. **Serve**: [`Application::serve`] binds the listener and handles requests
/// 3. **Shutdown**: once the shutdown future resolves, in-flight requests finish and the
///    background tasks are stopped
pub struct Application {
    router: Router,
    config: Config,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create the application against the configured mail server and Mailcow instance.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        info!(port = config.port, pattern = %config.alias.pattern, "Starting mcbridge");

        let (host, port) = config
            .mailcow
            .server_host_port()
            .context("mailcow.server_address must have the form host:port")?;
        info!(method = %config.mailcow.auth_method, server = %format!("{host}:{port}"), "Initializing authentication");
        let verifier = auth::create_verifier(&config.mailcow).context("Failed to initialize authentication")?;

        info!(url = %config.mailcow.api_url, "Initializing Mailcow API client");
        let client = MailcowClient::new(&config.mailcow).context("Failed to initialize Mailcow API client")?;
        client
            .check_connectivity()
            .await
            .context("Mailcow API connectivity check failed")?;

        Self::from_collaborators(config, verifier, Arc::new(client))
    }

    /// Assemble the application around already constructed collaborators.
    pub fn from_collaborators(
        config: Config,
        verifier: Arc<dyn CredentialVerifier>,
        registry: Arc<dyn AliasRegistry>,
    ) -> anyhow::Result<Self> {
        let template = AliasTemplate::parse(config.alias.pattern.as_str()).context("Invalid alias pattern")?;
        let authenticator = Arc::new(Authenticator::new(verifier, config.auth_cache.ttl));
        if authenticator.is_cache_enabled() {
            info!(ttl = ?config.auth_cache.ttl, "Auth caching enabled");
        }

        let bg_services = BackgroundServices::start(&authenticator, config.auth_cache.cleanup_interval);

        let state = AppState::builder()
            .config(config.clone())
            .authenticator(authenticator)
            .registry(registry)
            .template(Arc::new(template))
            .build();
        let router = build_router(state)?;

        Ok(Self {
            router,
            config,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind {bind_addr}"))?;
        info!("mcbridge listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
