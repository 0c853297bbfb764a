//! Per-recipient outcomes and the sealed batch aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use volley_common::Address;
use volley_relay::SendError;

/// Terminal result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    Sent,
    Failed { reason: String },
}

impl SendStatus {
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// The outcome of one recipient's send attempt.
///
/// Created exactly once per recipient and never mutated afterwards.
/// `index` is 1-based and follows recipient input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOutcome {
    pub recipient: Address,
    pub index: usize,
    pub total: usize,
    pub status: SendStatus,
    pub timestamp: DateTime<Utc>,
}

impl SendOutcome {
    #[must_use]
    pub fn sent(recipient: Address, index: usize, total: usize) -> Self {
        Self {
            recipient,
            index,
            total,
            status: SendStatus::Sent,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn failed(recipient: Address, index: usize, total: usize, error: &SendError) -> Self {
        Self {
            recipient,
            index,
            total,
            status: SendStatus::Failed {
                reason: error.to_string(),
            },
            timestamp: Utc::now(),
        }
    }
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchDisposition {
    /// Every recipient was processed.
    Completed,
    /// The batch stopped early (authentication failure or cancellation);
    /// outcomes cover a prefix of the recipient list.
    Aborted,
}

/// The sealed result of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub outcomes: Vec<SendOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub disposition: BatchDisposition,
    pub completed_at: DateTime<Utc>,
}

impl BatchResult {
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self.disposition, BatchDisposition::Aborted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_human_readable() {
        assert_eq!(SendStatus::Sent.to_string(), "sent");
        assert_eq!(
            SendStatus::Failed {
                reason: "recipient rejected: 550 no such user".to_string()
            }
            .to_string(),
            "failed: recipient rejected: 550 no such user"
        );
    }

    #[test]
    fn failed_outcome_captures_error_text() {
        let recipient = Address::parse("user@example.com").unwrap();
        let error = SendError::Timeout("RCPT TO timed out after 30s".to_string());
        let outcome = SendOutcome::failed(recipient, 2, 5, &error);

        assert_eq!(outcome.index, 2);
        assert_eq!(outcome.total, 5);
        assert_eq!(
            outcome.status,
            SendStatus::Failed {
                reason: "timed out: RCPT TO timed out after 30s".to_string()
            }
        );
    }
}
