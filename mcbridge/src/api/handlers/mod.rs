//! HTTP request handlers.
//!
//! - [`aliases`]: random alias creation and the [`aliases::MailboxCredentials`] extractor
//! - [`health`]: liveness probe

pub mod aliases;
pub mod health;
