//! SMTP submission client for the volley dispatch engine.
//!
//! This crate owns the "send one message to one recipient" primitive:
//! - A minimal async SMTP client ([`RelayClient`]) speaking the
//!   submission dialect: EHLO, STARTTLS, AUTH, MAIL FROM, RCPT TO,
//!   DATA, QUIT.
//! - A MIME message builder for the template content.
//! - A per-attempt transaction ([`SubmissionTransaction`]) with
//!   per-operation deadlines.
//! - The [`Mailer`] seam the orchestrator drives, with its production
//!   implementation [`SmtpMailer`] and the [`SendError`] taxonomy.

mod client;
mod error;
mod mailer;
mod message;
mod response;
mod timeouts;
mod transaction;

pub use client::RelayClient;
pub use error::ClientError;
pub use mailer::{Mailer, SendError, SmtpMailer};
pub use message::MessageBuilder;
pub use response::{Response, ResponseLine};
pub use timeouts::RelayTimeouts;
pub use transaction::SubmissionTransaction;
