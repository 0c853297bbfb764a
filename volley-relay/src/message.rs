//! RFC 5322 message construction for submission.

use std::io::Write;

use volley_common::{Address, BodyFormat, MessageTemplate, RelayCredentials};

use crate::error::{ClientError, Result};

/// Builds the wire form of one message for one recipient.
///
/// The same template is rendered for every recipient of a batch; only
/// the To header changes between sends.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Option<String>,
    reply_to: Option<String>,
    subject: Option<String>,
    priority: Option<&'static str>,
    content_type: &'static str,
    body: Option<String>,
}

impl MessageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            content_type: BodyFormat::Plain.mime_type(),
            ..Self::default()
        }
    }

    /// Pre-populates sender identity, subject, body, and priority from
    /// the batch template and relay credentials.
    #[must_use]
    pub fn from_template(template: &MessageTemplate, credentials: &RelayCredentials) -> Self {
        let mut builder = Self::new()
            .from(credentials.from_header())
            .subject(template.subject.clone())
            .format(template.body_format)
            .priority(template.priority.header_value())
            .body(template.body.clone());

        if let Some(reply_to) = credentials
            .reply_to
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            builder = builder.reply_to(reply_to.to_string());
        }

        builder
    }

    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    #[must_use]
    pub fn to(mut self, recipient: &Address) -> Self {
        self.to = Some(recipient.to_string());
        self
    }

    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub const fn format(mut self, format: BodyFormat) -> Self {
        self.content_type = format.mime_type();
        self
    }

    #[must_use]
    pub const fn priority(mut self, header_value: &'static str) -> Self {
        self.priority = Some(header_value);
        self
    }

    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    /// Renders headers and body with CRLF framing.
    ///
    /// # Errors
    ///
    /// Returns an error when the rendered message is not valid UTF-8.
    pub fn build(self) -> Result<String> {
        let mut message = Vec::with_capacity(1024);

        if let Some(from) = &self.from {
            write!(&mut message, "From: {from}\r\n")?;
        }
        if let Some(to) = &self.to {
            write!(&mut message, "To: {to}\r\n")?;
        }
        if let Some(reply_to) = &self.reply_to {
            write!(&mut message, "Reply-To: {reply_to}\r\n")?;
        }
        if let Some(subject) = &self.subject {
            write!(&mut message, "Subject: {subject}\r\n")?;
        }
        if let Some(priority) = self.priority {
            write!(&mut message, "X-Priority: {priority}\r\n")?;
        }

        write!(&mut message, "MIME-Version: 1.0\r\n")?;
        write!(
            &mut message,
            "Content-Type: {}; charset=utf-8\r\n",
            self.content_type
        )?;

        write!(&mut message, "\r\n")?;

        if let Some(body) = &self.body {
            write!(&mut message, "{body}")?;
        }

        String::from_utf8(message).map_err(|e| ClientError::Utf8(e.utf8_error()))
    }
}
