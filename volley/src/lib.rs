//! Service assembly for the volley dispatch engine.

pub mod config;

pub use config::{Config, ConfigError};
