//! IMAPS credential check.
//!
//! Opens an implicit-TLS connection, issues `LOGIN` and, on success, `LOGOUT`. Only the tagged
//! completion of `LOGIN` decides the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::{ClientConfig, RootCertStore, pki_types::ServerName};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};

use super::{AuthError, CredentialVerifier};
use crate::config::AuthMethod;

pub struct ImapVerifier {
    host: String,
    port: u16,
    timeout: Duration,
    server_name: ServerName<'static>,
    connector: TlsConnector,
}

impl ImapVerifier {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, AuthError> {
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|_| AuthError::InvalidServerAddress(host.to_string()))?;

        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| AuthError::Tls(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            host: host.to_string(),
            port,
            timeout,
            server_name,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }

    fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    async fn connect_and_login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| AuthError::Connection {
                address: self.address(),
                source,
            })?;
        debug!("TCP connection established");

        let tls = self
            .connector
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(|e| AuthError::Tls(e.to_string()))?;
        debug!("TLS connection established");

        login(tls, username, password).await
    }
}

#[async_trait]
impl CredentialVerifier for ImapVerifier {
    #[instrument(skip_all, fields(server = %self.address()))]
    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthError> {
        tokio::time::timeout(self.timeout, self.connect_and_login(username, password))
            .await
            .map_err(|_| AuthError::Timeout(self.timeout))?
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::Imap
    }
}

/// Run the `LOGIN`/`LOGOUT` exchange over an established stream.
pub async fn login<S>(stream: S, username: &str, password: &str) -> Result<(), AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);

    let greeting = read_line(&mut stream).await?;
    if !greeting.starts_with("* OK") {
        return Err(AuthError::Protocol(format!("unexpected greeting: {greeting}")));
    }

    // Arguments that need a literal are sent in pieces, each waiting for the server's go-ahead.
    let mut pending = String::from("a1 LOGIN");
    for value in [username, password] {
        pending.push(' ');
        match encode(value)? {
            Argument::Quoted(quoted) => pending.push_str(&quoted),
            Argument::Literal(raw) => {
                pending.push_str(&format!("{{{}}}\r\n", raw.len()));
                send(&mut stream, &pending).await?;
                await_continuation(&mut stream).await?;
                pending = raw.to_string();
            }
        }
    }
    pending.push_str("\r\n");
    send(&mut stream, &pending).await?;

    loop {
        let line = read_line(&mut stream).await?;
        let Some(status) = line.strip_prefix("a1 ") else {
            // Untagged data such as CAPABILITY may precede the completion.
            continue;
        };
        match status_word(status) {
            "OK" => break,
            _ => return Err(login_failure(status, &line)),
        }
    }
    debug!("IMAP login successful");

    // The login already succeeded; a failed LOGOUT only costs the server a dangling session.
    if let Err(e) = logout(&mut stream).await {
        debug!("IMAP logout error: {e}");
    }
    Ok(())
}

/// Wait for a `+` continuation request. A tagged reply instead means the server refused the command.
async fn await_continuation<S>(stream: &mut BufReader<S>) -> Result<(), AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let line = read_line(stream).await?;
        if line.starts_with('+') {
            return Ok(());
        }
        if let Some(status) = line.strip_prefix("a1 ") {
            return Err(match status_word(status) {
                "OK" => AuthError::Protocol(format!("LOGIN completed before its arguments were sent: {line}")),
                _ => login_failure(status, &line),
            });
        }
    }
}

fn status_word(status: &str) -> &str {
    status.split_once(' ').map_or(status, |(word, _)| word)
}

fn login_failure(status: &str, line: &str) -> AuthError {
    match status_word(status) {
        "NO" | "BAD" => AuthError::Rejected {
            method: AuthMethod::Imap,
            message: status.to_string(),
        },
        _ => AuthError::Protocol(format!("unexpected LOGIN response: {line}")),
    }
}

async fn logout<S>(stream: &mut BufReader<S>) -> Result<(), AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send(stream, "a2 LOGOUT\r\n").await?;
    loop {
        let line = read_line(stream).await?;
        if line.starts_with("a2 ") {
            return Ok(());
        }
    }
}

async fn send<S>(stream: &mut BufReader<S>, command: &str) -> Result<(), AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let inner = stream.get_mut();
    inner
        .write_all(command.as_bytes())
        .await
        .map_err(|e| AuthError::Protocol(format!("write failed: {e}")))?;
    inner
        .flush()
        .await
        .map_err(|e| AuthError::Protocol(format!("write failed: {e}")))
}

async fn read_line<S>(stream: &mut BufReader<S>) -> Result<String, AuthError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut line = String::new();
    let read = stream
        .read_line(&mut line)
        .await
        .map_err(|e| AuthError::Protocol(format!("read failed: {e}")))?;
    if read == 0 {
        return Err(AuthError::Protocol("connection closed by server".to_string()));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum Argument<'a> {
    Quoted(String),
    Literal(&'a str),
}

/// Encode a `LOGIN` argument. 7-bit values become quoted strings, anything else is sent as a
/// synchronizing literal. Line breaks and NUL are not allowed in either form.
fn encode(value: &str) -> Result<Argument<'_>, AuthError> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(AuthError::Rejected {
            method: AuthMethod::Imap,
            message: "credentials contain control characters".to_string(),
        });
    }
    if !value.is_ascii() {
        return Ok(Argument::Literal(value));
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(Argument::Quoted(quoted))
}
