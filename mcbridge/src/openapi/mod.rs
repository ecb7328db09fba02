//! OpenAPI documentation, served as JSON at `/openapi.json` and rendered at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

struct MailboxSecurityAddon;

impl Modify for MailboxSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "MailboxAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authentication",
                    "Mailbox address and password of the caller, joined by a colon:\n\n\
                    ```\nAuthentication: alice@example.com:password\n```\n\n\
                    The credentials are checked by logging in to the mail server.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mcbridge",
        description = "SimpleLogin-compatible alias creation for Mailcow mailboxes."
    ),
    modifiers(&MailboxSecurityAddon),
    paths(
        api::handlers::aliases::create_random_alias,
        api::handlers::health::healthz,
    ),
    components(schemas(api::models::aliases::AliasResponse)),
    tags(
        (name = "aliases", description = "Create forwarding aliases for the authenticated mailbox."),
        (name = "health", description = "Service health."),
    )
)]
pub struct ApiDoc;
