//! HTTP handlers for alias creation.

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::{
    AppState,
    api::models::aliases::AliasResponse,
    auth::mask_username,
    errors::{Error, Result},
};

/// Header carrying `username:password`. SimpleLogin clients send it under this name, not
/// `Authorization`.
pub const AUTHENTICATION_HEADER: &str = "Authentication";

/// Mailbox credentials taken from the `Authentication` header.
///
/// The value is split at the first `:`, so passwords may contain colons.
pub struct MailboxCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for MailboxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxCredentials")
            .field("username", &mask_username(&self.username))
            .finish_non_exhaustive()
    }
}

impl MailboxCredentials {
    fn parse(value: &str) -> Option<Self> {
        let (username, password) = value.split_once(':')?;
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MailboxCredentials {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHENTICATION_HEADER)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Unauthorized: Authentication header required".to_string()),
            })?;

        header
            .to_str()
            .ok()
            .and_then(MailboxCredentials::parse)
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Unauthorized: Authentication header must be in the format 'username:password'".to_string()),
            })
    }
}

#[utoipa::path(
    post,
    path = "/api/alias/random/new",
    tag = "aliases",
    summary = "Create random alias",
    description = "Verify the caller's mailbox credentials against the mail server, generate an alias from the \
configured pattern on the caller's domain and register it in Mailcow as a forward to the caller's mailbox.

The `expiration_date` is informational; the alias itself does not expire.",
    responses(
        (status = 200, description = "Alias created", body = AliasResponse),
        (status = 401, description = "Missing or malformed `Authentication` header, or the mail server refused the credentials", body = String),
        (status = 500, description = "Alias generation failed or Mailcow refused the alias", body = String),
    ),
    security(("MailboxAuth" = []))
)]
#[instrument(skip_all, fields(user = %mask_username(&credentials.username)))]
pub async fn create_random_alias(State(state): State<AppState>, credentials: MailboxCredentials) -> Result<Json<AliasResponse>> {
    state
        .authenticator
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    let alias = state.template.expand(&mut rand::rng(), &credentials.username)?;
    debug!(pattern = state.template.pattern(), %alias, "Generated alias");

    state.registry.create_alias(&alias, &credentials.username).await?;

    let response = AliasResponse::new(alias, Utc::now(), state.config.alias.validity_years);
    info!(alias = %response.alias, expires = %response.expiration_date, "Alias created");
    Ok(Json(response))
}
