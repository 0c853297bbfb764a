//! Shared foundations for the volley bulk dispatch engine.

pub mod address;
pub mod logging;
pub mod message;
pub mod recipient;

pub use address::{Address, AddressError};
pub use message::{BodyFormat, MessageTemplate, Priority, RelayCredentials};
pub use recipient::{RecipientError, normalize_recipients};

/// Control signal broadcast to long-running components.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
