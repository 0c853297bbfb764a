//! Wire types for the form contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use volley_common::{BodyFormat, MessageTemplate, Priority, RelayCredentials};
use volley_dispatch::{BatchResult, DispatchRequest};

use crate::error::ApiError;

/// The `POST /send_email` body, field names as the form submits them.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// "1" | "3" | "5"; the form defaults to normal.
    #[serde(default)]
    pub priority: Option<String>,
    /// Comma- or newline-separated blob.
    pub recipients: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub body_type: BodyFormat,
    /// Pacing interval in whole seconds.
    #[serde(default)]
    pub interval: u64,
}

impl SendEmailRequest {
    /// Validates the form fields into an immutable batch request.
    ///
    /// # Errors
    ///
    /// [`ApiError`] when the recipient blob or priority is unusable.
    pub fn into_dispatch_request(self) -> Result<DispatchRequest, ApiError> {
        let priority = match &self.priority {
            None => Priority::default(),
            Some(value) if value.trim().is_empty() => Priority::default(),
            Some(value) => Priority::from_form_value(value)
                .ok_or_else(|| ApiError::InvalidPriority(value.clone()))?,
        };

        let credentials = RelayCredentials {
            host: self.smtp_server,
            port: self.smtp_port,
            username: self.smtp_username,
            secret: self.smtp_password,
            from_address: self.from_email,
            from_name: self.from_name,
            reply_to: self
                .reply_to
                .filter(|value| !value.trim().is_empty()),
        };

        let template = MessageTemplate {
            subject: self.subject,
            body: self.body,
            body_format: self.body_type,
            priority,
        };

        Ok(DispatchRequest::new(
            credentials,
            template,
            &self.recipients,
            Duration::from_secs(self.interval),
        )?)
    }
}

/// One row of the results array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntry {
    /// 1-based position in the normalized recipient list.
    pub index: usize,
    pub total: usize,
    pub recipient: String,
    /// Human-readable outcome: "sent" or "failed: <reason>".
    pub status: String,
}

/// The `POST /send_email` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub results: Vec<ResultEntry>,
}

impl From<BatchResult> for SendEmailResponse {
    fn from(result: BatchResult) -> Self {
        Self {
            results: result
                .outcomes
                .into_iter()
                .map(|outcome| ResultEntry {
                    index: outcome.index,
                    total: outcome.total,
                    recipient: outcome.recipient.to_string(),
                    status: outcome.status.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form_request() -> SendEmailRequest {
        SendEmailRequest {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: "secret".to_string(),
            from_email: "noreply@example.com".to_string(),
            from_name: "Example".to_string(),
            reply_to: Some(String::new()),
            priority: Some("3".to_string()),
            recipients: "a@x.com, b@x.com".to_string(),
            subject: "subject".to_string(),
            body: "body".to_string(),
            body_type: BodyFormat::Plain,
            interval: 2,
        }
    }

    #[test]
    fn builds_dispatch_request() {
        let request = form_request().into_dispatch_request().unwrap();
        assert_eq!(request.total(), 2);
        assert_eq!(request.interval(), Duration::from_secs(2));
        assert_eq!(request.credentials().reply_to, None);
        assert_eq!(request.template().priority, Priority::Normal);
    }

    #[test]
    fn rejects_unknown_priority() {
        let mut form = form_request();
        form.priority = Some("urgent".to_string());
        assert!(matches!(
            form.into_dispatch_request().unwrap_err(),
            ApiError::InvalidPriority(value) if value == "urgent"
        ));
    }

    #[test]
    fn missing_priority_defaults_to_normal() {
        let mut form = form_request();
        form.priority = None;
        let request = form.into_dispatch_request().unwrap();
        assert_eq!(request.template().priority, Priority::Normal);
    }

    #[test]
    fn malformed_recipients_are_rejected() {
        let mut form = form_request();
        form.recipients = "not-an-address".to_string();
        assert!(matches!(
            form.into_dispatch_request().unwrap_err(),
            ApiError::Dispatch(_)
        ));
    }

    #[test]
    fn deserializes_form_payload() {
        let request: SendEmailRequest = serde_json::from_str(
            r#"{
                "smtp_server": "smtp.example.com",
                "smtp_port": 587,
                "smtp_username": "mailer",
                "smtp_password": "secret",
                "from_email": "noreply@example.com",
                "from_name": "Example",
                "recipients": "a@x.com",
                "subject": "s",
                "body": "b",
                "body_type": "html",
                "interval": 5
            }"#,
        )
        .unwrap();

        assert_eq!(request.body_type, BodyFormat::Html);
        assert_eq!(request.interval, 5);
        assert_eq!(request.priority, None);
    }
}
