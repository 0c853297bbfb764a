//! Per-operation timeout configuration for relay transactions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadlines for each step of a submission transaction.
///
/// A hung relay must surface as a `Timeout` outcome rather than stall
/// the batch, so every verb carries its own bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayTimeouts {
    /// Connection establishment plus greeting.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::connect_secs")]
    pub connect_secs: u64,

    /// EHLO exchange (initial and post-STARTTLS).
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::ehlo_secs")]
    pub ehlo_secs: u64,

    /// STARTTLS command and TLS handshake.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::starttls_secs")]
    pub starttls_secs: u64,

    /// AUTH exchange (all challenge round-trips).
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::auth_secs")]
    pub auth_secs: u64,

    /// MAIL FROM command.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::mail_from_secs")]
    pub mail_from_secs: u64,

    /// RCPT TO command.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::rcpt_to_secs")]
    pub rcpt_to_secs: u64,

    /// DATA command and message transmission. Longer than the other
    /// bounds to accommodate large bodies.
    ///
    /// Default: 120 seconds
    #[serde(default = "defaults::data_secs")]
    pub data_secs: u64,

    /// QUIT command. A QUIT timeout never fails a delivered message.
    ///
    /// Default: 10 seconds
    #[serde(default = "defaults::quit_secs")]
    pub quit_secs: u64,
}

impl Default for RelayTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: defaults::connect_secs(),
            ehlo_secs: defaults::ehlo_secs(),
            starttls_secs: defaults::starttls_secs(),
            auth_secs: defaults::auth_secs(),
            mail_from_secs: defaults::mail_from_secs(),
            rcpt_to_secs: defaults::rcpt_to_secs(),
            data_secs: defaults::data_secs(),
            quit_secs: defaults::quit_secs(),
        }
    }
}

impl RelayTimeouts {
    pub(crate) const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub(crate) const fn ehlo(&self) -> Duration {
        Duration::from_secs(self.ehlo_secs)
    }

    pub(crate) const fn starttls(&self) -> Duration {
        Duration::from_secs(self.starttls_secs)
    }

    pub(crate) const fn auth(&self) -> Duration {
        Duration::from_secs(self.auth_secs)
    }

    pub(crate) const fn mail_from(&self) -> Duration {
        Duration::from_secs(self.mail_from_secs)
    }

    pub(crate) const fn rcpt_to(&self) -> Duration {
        Duration::from_secs(self.rcpt_to_secs)
    }

    pub(crate) const fn data(&self) -> Duration {
        Duration::from_secs(self.data_secs)
    }

    pub(crate) const fn quit(&self) -> Duration {
        Duration::from_secs(self.quit_secs)
    }
}

mod defaults {
    pub const fn connect_secs() -> u64 {
        30
    }

    pub const fn ehlo_secs() -> u64 {
        30
    }

    pub const fn starttls_secs() -> u64 {
        30
    }

    pub const fn auth_secs() -> u64 {
        30
    }

    pub const fn mail_from_secs() -> u64 {
        30
    }

    pub const fn rcpt_to_secs() -> u64 {
        30
    }

    pub const fn data_secs() -> u64 {
        120
    }

    pub const fn quit_secs() -> u64 {
        10
    }
}
