//! HTTP surface for the volley dispatch engine.
//!
//! Exposes the `POST /send_email` contract consumed by the form
//! frontend, plus a liveness probe. Each request drives one batch to
//! completion and answers with the per-recipient result array.

mod error;
mod server;
mod types;

pub use error::{ApiError, ServeError};
pub use server::{ApiServer, router};
pub use types::{ResultEntry, SendEmailRequest, SendEmailResponse};
