//! Validated, immutable batch requests.

use std::time::Duration;

use thiserror::Error;
use volley_common::{Address, MessageTemplate, RecipientError, RelayCredentials};

/// Failures that prevent a batch from starting.
///
/// These surface to the caller as a single top-level error; the send
/// primitive is never invoked for a request that fails to build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Recipients(#[from] RecipientError),
}

/// One batch: everything the orchestrator needs, validated up front
/// and immutable from then on.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    credentials: RelayCredentials,
    template: MessageTemplate,
    recipients: Vec<Address>,
    interval: Duration,
}

impl DispatchRequest {
    /// Builds a request from the raw recipient blob, normalizing and
    /// validating the list.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Recipients`] when the blob yields no valid
    /// recipients or contains malformed tokens.
    pub fn new(
        credentials: RelayCredentials,
        template: MessageTemplate,
        raw_recipients: &str,
        interval: Duration,
    ) -> Result<Self, DispatchError> {
        let recipients = volley_common::normalize_recipients(raw_recipients)?;

        Ok(Self {
            credentials,
            template,
            recipients,
            interval,
        })
    }

    #[must_use]
    pub const fn credentials(&self) -> &RelayCredentials {
        &self.credentials
    }

    #[must_use]
    pub const fn template(&self) -> &MessageTemplate {
        &self.template
    }

    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.recipients.len()
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use volley_common::{BodyFormat, MessageTemplate, Priority};

    use super::*;

    fn credentials() -> RelayCredentials {
        RelayCredentials {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            secret: "secret".to_string(),
            from_address: "noreply@example.com".to_string(),
            from_name: String::new(),
            reply_to: None,
        }
    }

    fn template() -> MessageTemplate {
        MessageTemplate {
            subject: "s".to_string(),
            body: "b".to_string(),
            body_format: BodyFormat::Plain,
            priority: Priority::Normal,
        }
    }

    #[test]
    fn builds_with_normalized_recipients() {
        let request = DispatchRequest::new(
            credentials(),
            template(),
            "a@x.com, a@x.com, b@x.com",
            Duration::ZERO,
        )
        .unwrap();

        assert_eq!(request.total(), 2);
        assert_eq!(request.recipients()[0].to_string(), "a@x.com");
        assert_eq!(request.recipients()[1].to_string(), "b@x.com");
    }

    #[test]
    fn empty_blob_never_builds() {
        let error =
            DispatchRequest::new(credentials(), template(), "  ", Duration::ZERO).unwrap_err();
        assert_eq!(
            error,
            DispatchError::Recipients(RecipientError::NoRecipients)
        );
    }

    #[test]
    fn malformed_tokens_never_build() {
        let error = DispatchRequest::new(
            credentials(),
            template(),
            "a@x.com, not-an-address",
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            DispatchError::Recipients(RecipientError::Invalid(tokens)) if tokens == ["not-an-address"]
        ));
    }
}
