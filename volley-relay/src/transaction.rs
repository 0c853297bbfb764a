//! One complete submission transaction.
//!
//! A transaction is a single delivery attempt for a single recipient:
//! connect, greet, EHLO, STARTTLS when offered (or required), AUTH,
//! MAIL FROM, RCPT TO, DATA, QUIT. Every step runs under its own
//! deadline and failures are mapped into the [`SendError`] taxonomy the
//! orchestrator acts on.

use std::time::Duration;

use volley_common::{Address, RelayCredentials};

use crate::client::RelayClient;
use crate::error::ClientError;
use crate::mailer::SendError;
use crate::response::Response;
use crate::timeouts::RelayTimeouts;

/// A single SMTP submission attempt.
pub struct SubmissionTransaction<'a> {
    credentials: &'a RelayCredentials,
    recipient: &'a Address,
    payload: &'a str,
    timeouts: &'a RelayTimeouts,
    require_tls: bool,
}

impl<'a> SubmissionTransaction<'a> {
    #[must_use]
    pub const fn new(
        credentials: &'a RelayCredentials,
        recipient: &'a Address,
        payload: &'a str,
        timeouts: &'a RelayTimeouts,
        require_tls: bool,
    ) -> Self {
        Self {
            credentials,
            recipient,
            payload,
            timeouts,
            require_tls,
        }
    }

    /// Runs the transaction to completion.
    ///
    /// # Errors
    ///
    /// A [`SendError`] classifying the failure: fatal for the whole
    /// batch (`AuthenticationFailed`) or local to this recipient.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(relay = %self.credentials.endpoint(), recipient = %self.recipient)
    )]
    pub async fn execute(self) -> Result<(), SendError> {
        let mut client = self.connect_and_greet().await?;

        let ehlo = self.ehlo(&mut client).await?;
        let ehlo = self.negotiate_tls(&mut client, ehlo).await?;

        if !self.credentials.username.is_empty() {
            self.authenticate(&mut client, &ehlo).await?;
        }

        self.send_envelope(&mut client).await?;
        self.send_payload(&mut client).await?;

        // The message is accepted at this point. A failed QUIT must not
        // fail the delivery.
        if let Err(e) = bounded(self.timeouts.quit(), "QUIT", client.quit()).await {
            tracing::debug!(error = %e, "QUIT after accepted message failed");
        }

        Ok(())
    }

    async fn connect_and_greet(&self) -> Result<RelayClient, SendError> {
        let endpoint = self.credentials.endpoint();

        let mut client = bounded(self.timeouts.connect(), "connect", async {
            RelayClient::connect(&endpoint, self.credentials.host.clone()).await
        })
        .await
        .map_err(|e| match e {
            SendError::TransientNetwork(msg) => {
                SendError::TransientNetwork(format!("failed to connect to {endpoint}: {msg}"))
            }
            other => other,
        })?;

        let greeting = bounded(self.timeouts.connect(), "greeting", client.read_greeting()).await?;
        if !greeting.is_success() {
            return Err(SendError::TransientNetwork(format!(
                "relay rejected connection: {}",
                greeting.message()
            )));
        }

        Ok(client)
    }

    async fn ehlo(&self, client: &mut RelayClient) -> Result<Response, SendError> {
        let domain = helo_domain(&self.credentials.from_address);
        let response = bounded(self.timeouts.ehlo(), "EHLO", client.ehlo(domain)).await?;

        if !response.is_success() {
            return Err(SendError::TransientNetwork(format!(
                "relay rejected EHLO: {}",
                response.message()
            )));
        }

        Ok(response)
    }

    /// Upgrades to TLS when the relay offers STARTTLS, or when TLS is
    /// required. Returns the EHLO response whose capabilities are
    /// current for the (possibly upgraded) channel.
    async fn negotiate_tls(
        &self,
        client: &mut RelayClient,
        ehlo: Response,
    ) -> Result<Response, SendError> {
        let offered = advertises(&ehlo, "STARTTLS");

        if !offered {
            if self.require_tls {
                return Err(SendError::TransientNetwork(format!(
                    "TLS required but {} does not offer STARTTLS",
                    self.credentials.host
                )));
            }
            return Ok(ehlo);
        }

        let response = bounded(self.timeouts.starttls(), "STARTTLS", client.starttls()).await;
        match response {
            Ok(response) if response.is_success() => {
                // RFC 3207: the session state resets; EHLO again.
                self.ehlo(client).await
            }
            Ok(response) => {
                if self.require_tls {
                    return Err(SendError::TransientNetwork(format!(
                        "relay rejected required STARTTLS: {}",
                        response.message()
                    )));
                }
                tracing::debug!(
                    relay = %self.credentials.host,
                    reply = %response.message(),
                    "STARTTLS rejected, continuing in plaintext"
                );
                Ok(ehlo)
            }
            Err(e) => Err(e),
        }
    }

    async fn authenticate(
        &self,
        client: &mut RelayClient,
        ehlo: &Response,
    ) -> Result<(), SendError> {
        let mechanisms = auth_mechanisms(ehlo);
        let username = &self.credentials.username;
        let secret = &self.credentials.secret;

        // PLAIN preferred; LOGIN only when it is the relay's sole offer.
        let login_only = mechanisms.iter().any(|m| m == "LOGIN")
            && !mechanisms.iter().any(|m| m == "PLAIN");
        let response = if login_only {
            bounded(self.timeouts.auth(), "AUTH", client.auth_login(username, secret)).await?
        } else {
            bounded(self.timeouts.auth(), "AUTH", client.auth_plain(username, secret)).await?
        };

        if response.is_success() {
            Ok(())
        } else {
            Err(SendError::AuthenticationFailed(format!(
                "{} {}",
                response.code,
                response.message()
            )))
        }
    }

    async fn send_envelope(&self, client: &mut RelayClient) -> Result<(), SendError> {
        let sender = &self.credentials.from_address;
        let response = bounded(
            self.timeouts.mail_from(),
            "MAIL FROM",
            client.mail_from(sender),
        )
        .await?;
        if !response.is_success() {
            return Err(reject_or_transient(&response, "relay rejected MAIL FROM"));
        }

        let recipient = self.recipient.to_string();
        let response = bounded(
            self.timeouts.rcpt_to(),
            "RCPT TO",
            client.rcpt_to(&recipient),
        )
        .await?;
        if !response.is_success() {
            return Err(reject_or_transient(
                &response,
                &format!("relay rejected RCPT TO {recipient}"),
            ));
        }

        Ok(())
    }

    async fn send_payload(&self, client: &mut RelayClient) -> Result<(), SendError> {
        let response = bounded(self.timeouts.data(), "DATA", client.data()).await?;
        if !response.is_intermediate() {
            return Err(reject_or_transient(&response, "relay rejected DATA"));
        }

        let response = bounded(
            self.timeouts.data(),
            "message content",
            client.send_data(self.payload),
        )
        .await?;
        if !response.is_success() {
            return Err(reject_or_transient(&response, "relay rejected message"));
        }

        Ok(())
    }
}

/// Runs `operation` under `limit`, mapping elapsed deadlines to
/// [`SendError::Timeout`] and client failures through their
/// categorization.
async fn bounded<T>(
    limit: Duration,
    what: &str,
    operation: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, SendError> {
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| SendError::Timeout(format!("{what} timed out after {limit:?}")))?
        .map_err(SendError::from)
}

/// 5xx replies are final for this envelope; anything else is worth a
/// retry elsewhere.
fn reject_or_transient(response: &Response, context: &str) -> SendError {
    let detail = format!("{context}: {} {}", response.code, response.message());
    if response.is_permanent_error() {
        SendError::RecipientRejected(detail)
    } else {
        SendError::TransientNetwork(detail)
    }
}

fn advertises(ehlo: &Response, capability: &str) -> bool {
    ehlo.lines
        .iter()
        .any(|line| line.to_uppercase().starts_with(capability))
}

/// Mechanism keywords from the EHLO `AUTH` capability line.
fn auth_mechanisms(ehlo: &Response) -> Vec<String> {
    ehlo.lines
        .iter()
        .find_map(|line| {
            line.to_uppercase().strip_prefix("AUTH ").map(|mechanisms| {
                mechanisms
                    .split_whitespace()
                    .map(ToString::to_string)
                    .collect()
            })
        })
        .unwrap_or_default()
}

/// EHLO identity: the sender's domain when present, a fixed fallback
/// otherwise.
fn helo_domain(from_address: &str) -> &str {
    from_address
        .rsplit_once('@')
        .map_or("localhost", |(_, domain)| domain)
}
