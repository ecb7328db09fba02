//! SMTPS credential check via lettre.
//!
//! A transport with the caller's credentials is built per check; lettre authenticates while
//! opening the connection, so a successful `test_connection` means the login was accepted.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, Tokio1Executor,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use tracing::{debug, instrument};

use super::{AuthError, CredentialVerifier};
use crate::config::AuthMethod;

pub struct SmtpVerifier {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpVerifier {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn map_error(&self, error: SmtpError) -> AuthError {
        if error.is_timeout() {
            return AuthError::Timeout(self.timeout);
        }
        if error.is_permanent() {
            return AuthError::Rejected {
                method: AuthMethod::Smtp,
                message: error.to_string(),
            };
        }
        if error.is_tls() {
            return AuthError::Tls(error.to_string());
        }

        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                return AuthError::Connection {
                    address: self.address(),
                    source: std::io::Error::new(io.kind(), io.to_string()),
                };
            }
            source = cause.source();
        }
        AuthError::Protocol(error.to_string())
    }
}

#[async_trait]
impl CredentialVerifier for SmtpVerifier {
    #[instrument(skip_all, fields(server = %self.address()))]
    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let transport: AsyncSmtpTransport<Tokio1Executor> = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| AuthError::Tls(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(self.timeout))
            .build();

        let connected = tokio::time::timeout(self.timeout, transport.test_connection())
            .await
            .map_err(|_| AuthError::Timeout(self.timeout))?
            .map_err(|e| self.map_error(e))?;

        if !connected {
            return Err(AuthError::Protocol("server did not answer after login".to_string()));
        }
        debug!("SMTP authentication successful");
        Ok(())
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::Smtp
    }
}
