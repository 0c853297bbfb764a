//! Minimal SMTP submission client.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{ClientError, Result};
use crate::response::Response;

/// Initial read buffer size for server replies.
const BUFFER_SIZE: usize = 4096;

/// Cap on read buffer growth; a reply larger than this is malformed.
const MAX_BUFFER_SIZE: usize = 512 * 1024;

/// The underlying connection, before or after STARTTLS.
enum Connection {
    Plain(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Connection {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => stream.write_all(data).await?,
            Self::Tls(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
        };
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(n)
    }

    /// Wraps a plain stream in TLS using the platform trust store.
    async fn upgrade(self, host: &str) -> Result<Self> {
        let Self::Plain(stream) = self else {
            return Err(ClientError::Tls("connection is already TLS".to_string()));
        };

        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for cert in native.certs {
            roots
                .add(cert)
                .map_err(|e| ClientError::Tls(format!("failed to add certificate: {e}")))?;
        }
        if !native.errors.is_empty() {
            tracing::warn!(errors = ?native.errors, "some native certificates could not be loaded");
        }

        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ClientError::Tls(format!("invalid server name {host:?}: {e}")))?;

        let stream = TlsConnector::from(Arc::new(config))
            .connect(server_name, stream)
            .await
            .map_err(|e| ClientError::Tls(e.to_string()))?;

        Ok(Self::Tls(Box::new(stream)))
    }
}

/// An SMTP client driving one relay connection.
pub struct RelayClient {
    connection: Option<Connection>,
    buffer: Vec<u8>,
    filled: usize,
    host: String,
}

impl RelayClient {
    /// Opens a TCP connection to `endpoint` (`host:port`). `host` is
    /// kept for TLS server-name verification on STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established.
    pub async fn connect(endpoint: &str, host: impl Into<String>) -> Result<Self> {
        let stream = TcpStream::connect(endpoint).await?;

        Ok(Self {
            connection: Some(Connection::Plain(stream)),
            buffer: vec![0u8; BUFFER_SIZE],
            filled: 0,
            host: host.into(),
        })
    }

    /// Reads the 220 greeting the server sends on connect.
    pub async fn read_greeting(&mut self) -> Result<Response> {
        self.read_reply().await
    }

    /// Sends one command line and reads the reply.
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        let data = format!("{command}\r\n");
        self.connection_mut()?.write(data.as_bytes()).await?;
        self.read_reply().await
    }

    pub async fn ehlo(&mut self, domain: &str) -> Result<Response> {
        self.command(&format!("EHLO {domain}")).await
    }

    pub async fn mail_from(&mut self, from: &str) -> Result<Response> {
        self.command(&format!("MAIL FROM:<{from}>")).await
    }

    pub async fn rcpt_to(&mut self, to: &str) -> Result<Response> {
        self.command(&format!("RCPT TO:<{to}>")).await
    }

    pub async fn data(&mut self) -> Result<Response> {
        self.command("DATA").await
    }

    pub async fn quit(&mut self) -> Result<Response> {
        self.command("QUIT").await
    }

    /// AUTH PLAIN with the initial response inline (RFC 4616).
    pub async fn auth_plain(&mut self, username: &str, secret: &str) -> Result<Response> {
        let token = BASE64.encode(format!("\0{username}\0{secret}"));
        self.command(&format!("AUTH PLAIN {token}")).await
    }

    /// AUTH LOGIN: two 334 challenges answered with base64 username
    /// and secret.
    pub async fn auth_login(&mut self, username: &str, secret: &str) -> Result<Response> {
        let challenge = self.command("AUTH LOGIN").await?;
        if !challenge.is_intermediate() {
            return Ok(challenge);
        }

        let challenge = self.command(&BASE64.encode(username)).await?;
        if !challenge.is_intermediate() {
            return Ok(challenge);
        }

        self.command(&BASE64.encode(secret)).await
    }

    /// Sends the message content followed by the end-of-data marker.
    ///
    /// The payload is expected after a 354 reply to DATA.
    pub async fn send_data(&mut self, payload: &str) -> Result<Response> {
        let connection = self.connection_mut()?;
        connection.write(payload.as_bytes()).await?;

        if payload.ends_with("\r\n") {
            // Already CRLF-terminated.
        } else if payload.ends_with('\n') {
            connection.write(b"\r").await?;
        } else {
            connection.write(b"\r\n").await?;
        }

        connection.write(b".\r\n").await?;
        self.read_reply().await
    }

    /// STARTTLS followed by the TLS upgrade when the server accepts.
    pub async fn starttls(&mut self) -> Result<Response> {
        let response = self.command("STARTTLS").await?;

        if response.is_success() {
            let connection = self
                .connection
                .take()
                .ok_or(ClientError::ConnectionClosed)?;
            self.connection = Some(connection.upgrade(&self.host).await?);
            // Any pipelined plaintext is void after the handshake.
            self.filled = 0;
        }

        Ok(response)
    }

    fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.connection.as_mut().ok_or(ClientError::ConnectionClosed)
    }

    /// Reads until one complete (possibly multi-line) reply is parsed.
    async fn read_reply(&mut self) -> Result<Response> {
        loop {
            if let Some((response, consumed)) = Response::parse_reply(&self.buffer[..self.filled])?
            {
                self.buffer.copy_within(consumed..self.filled, 0);
                self.filled -= consumed;
                return Ok(response);
            }

            if self.filled >= self.buffer.len() {
                let grown = self.buffer.len() * 2;
                if grown > MAX_BUFFER_SIZE {
                    return Err(ClientError::Parse(format!(
                        "reply exceeds {MAX_BUFFER_SIZE} bytes"
                    )));
                }
                self.buffer.resize(grown, 0);
            }

            let connection = self
                .connection
                .as_mut()
                .ok_or(ClientError::ConnectionClosed)?;
            let n = connection.read(&mut self.buffer[self.filled..]).await?;
            self.filled += n;
        }
    }
}
