//! Recipient list normalization.
//!
//! Raw recipient blobs arrive as comma- or newline-separated text (the
//! file-import path upstream converts newlines to commas, so both
//! separators are equivalent here). Normalization validates every token
//! and reports all malformed ones in a single pass, so a caller can fix
//! the whole list at once.

use thiserror::Error;

use crate::address::Address;

/// Failure to produce a usable recipient list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipientError {
    /// The blob contained no tokens at all.
    #[error("no recipients provided")]
    NoRecipients,

    /// One or more tokens failed address validation. Carries every
    /// offending token, in input order.
    #[error("invalid recipients: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

/// Parses a raw recipient blob into a deduplicated, ordered address list.
///
/// Tokens are split on commas and newlines, trimmed, and validated via
/// [`Address::parse`]. Duplicates (case-insensitive, since addresses are
/// case-normalized) are dropped, keeping the first occurrence. Input
/// order is preserved.
///
/// # Errors
///
/// [`RecipientError::Invalid`] if any token is malformed (all offenders
/// collected), or [`RecipientError::NoRecipients`] if the blob holds no
/// tokens.
pub fn normalize_recipients(raw: &str) -> Result<Vec<Address>, RecipientError> {
    let mut recipients = Vec::new();
    let mut malformed = Vec::new();

    for token in raw.split([',', '\n']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match Address::parse(token) {
            Ok(address) => {
                if !recipients.contains(&address) {
                    recipients.push(address);
                }
            }
            Err(_) => malformed.push(token.to_string()),
        }
    }

    if !malformed.is_empty() {
        return Err(RecipientError::Invalid(malformed));
    }

    if recipients.is_empty() {
        return Err(RecipientError::NoRecipients);
    }

    Ok(recipients)
}
