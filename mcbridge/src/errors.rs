use crate::alias::GenerationError;
use crate::auth::AuthError;
use crate::mailcow::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Credentials missing from the request or not in `username:password` form
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// The mail server refused the credentials, or could not be asked
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The configured pattern or the caller's address could not produce an alias
    #[error("Failed to generate alias: {0}")]
    Generation(#[from] GenerationError),

    /// Mailcow did not accept the new alias
    #[error("Failed to create alias in Mailcow: {0}")]
    Registry(#[from] RegistryError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::Generation(_) | Error::Registry(_) | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to the caller.
    ///
    /// Collaborator failures are passed through with their cause, matching what password managers
    /// display to the user. Internal errors stay opaque.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Auth(_) | Error::Generation(_) | Error::Registry(_) => self.to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::Generation(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Registry(_) => {
                tracing::error!("Mailcow error: {}", self);
            }
            Error::Auth(AuthError::Rejected { .. }) | Error::Unauthenticated { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Auth(_) => {
                tracing::warn!("Credential check error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
