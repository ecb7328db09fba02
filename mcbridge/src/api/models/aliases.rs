use chrono::{DateTime, Months, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A freshly created forwarding alias.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AliasResponse {
    /// The new address; mail to it is forwarded to the caller's mailbox
    #[schema(example = "Maren.Kalvo@example.com")]
    pub alias: String,
    /// RFC 3339 timestamp, informational only. Mailcow aliases do not expire.
    #[schema(example = "2036-10-19T08:30:00Z")]
    pub expiration_date: String,
}

impl AliasResponse {
    pub fn new(alias: String, created_at: DateTime<Utc>, validity_years: u32) -> Self {
        let expires = created_at
            .checked_add_months(Months::new(validity_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            alias,
            expiration_date: expires.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
