//! Message template and relay credential types.
//!
//! A [`MessageTemplate`] is reused verbatim for every recipient in a
//! batch; [`RelayCredentials`] are opaque to the dispatch loop and only
//! interpreted by the send primitive.

use serde::{Deserialize, Serialize};

/// Content type of the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Plain,
    Html,
}

impl BodyFormat {
    /// The MIME type written into the Content-Type header.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// Message priority, carried as the X-Priority header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// X-Priority header value (1 = highest, 5 = lowest).
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::High => "1",
            Self::Normal => "3",
            Self::Low => "5",
        }
    }

    /// Parses the form-level priority field ("1" | "3" | "5").
    #[must_use]
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::High),
            "3" => Some(Self::Normal),
            "5" => Some(Self::Low),
            _ => None,
        }
    }
}

/// The message content reused for every recipient of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub body_format: BodyFormat,
    #[serde(default)]
    pub priority: Priority,
}

/// Credentials and sender identity for one submission relay.
///
/// Read-only for the lifetime of a batch. The `secret` is kept out of
/// Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct RelayCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secret: String,
    pub from_address: String,
    pub from_name: String,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl RelayCredentials {
    /// `host:port` form used to open the connection.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// RFC 5322 From header value: `Name <address>`, or the bare
    /// address when no display name is configured.
    #[must_use]
    pub fn from_header(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name.trim(), self.from_address)
        }
    }
}

impl std::fmt::Debug for RelayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("reply_to", &self.reply_to)
            .finish()
    }
}
