//! The send primitive: one message, one recipient, one attempt.

use async_trait::async_trait;
use thiserror::Error;
use volley_common::{Address, MessageTemplate, RelayCredentials};

use crate::error::ClientError;
use crate::message::MessageBuilder;
use crate::timeouts::RelayTimeouts;
use crate::transaction::SubmissionTransaction;

/// Failure of a single send attempt.
///
/// The orchestrator branches on the kind: authentication failures are
/// fatal for the whole batch (credentials are shared), everything else
/// is local to the recipient.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The relay refused the shared credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The relay permanently refused this envelope (5xx).
    #[error("recipient rejected: {0}")]
    RecipientRejected(String),

    /// Connection-level or temporary (4xx) failure; a retry may succeed.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// An operation deadline elapsed.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl SendError {
    /// `true` when the error poisons the whole batch.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// `true` when an immediate retry of the same attempt is sensible.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }
}

/// Connection-level failures are transient: the next attempt may reach
/// a healthy relay. Protocol violations are folded in with them, with
/// the reason string keeping the detail.
impl From<ClientError> for SendError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Io(e) => Self::TransientNetwork(format!("I/O error: {e}")),
            ClientError::ConnectionClosed => {
                Self::TransientNetwork("connection closed unexpectedly".to_string())
            }
            ClientError::Tls(msg) => Self::TransientNetwork(format!("TLS failure: {msg}")),
            ClientError::Parse(msg) => {
                Self::TransientNetwork(format!("malformed relay response: {msg}"))
            }
            ClientError::Utf8(e) => {
                Self::TransientNetwork(format!("relay response not UTF-8: {e}"))
            }
        }
    }
}

/// The "send one message" seam between the orchestrator and the relay.
///
/// Implementations perform exactly one outbound attempt per call and
/// never retry internally.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the rendered template to one recipient through the relay.
    ///
    /// # Errors
    ///
    /// A [`SendError`] classifying the failed attempt.
    async fn send(
        &self,
        credentials: &RelayCredentials,
        template: &MessageTemplate,
        recipient: &Address,
    ) -> Result<(), SendError>;
}

/// Production [`Mailer`] backed by a real SMTP submission transaction.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer {
    timeouts: RelayTimeouts,
    require_tls: bool,
}

impl SmtpMailer {
    #[must_use]
    pub const fn new(timeouts: RelayTimeouts, require_tls: bool) -> Self {
        Self {
            timeouts,
            require_tls,
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        credentials: &RelayCredentials,
        template: &MessageTemplate,
        recipient: &Address,
    ) -> Result<(), SendError> {
        let payload = MessageBuilder::from_template(template, credentials)
            .to(recipient)
            .build()?;

        SubmissionTransaction::new(
            credentials,
            recipient,
            &payload,
            &self.timeouts,
            self.require_tls,
        )
        .execute()
        .await
    }
}
