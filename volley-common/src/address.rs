//! Recipient address validation.
//!
//! Accepts the bare `local-part@domain` form that bulk recipient lists
//! carry. The grammar is a reduced RFC 5321 mailbox: a dot-string
//! local part and an LDH domain. Quoted-string local parts, source
//! routes, and `[address-literal]` domains are rejected here; those
//! belong to SMTP paths, not recipient lists. The domain must contain
//! at least two labels so that bare hostnames like `user@localhost`
//! are refused.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of the local part, in octets (RFC 5321 §4.5.3.1.1).
const MAX_LOCAL_PART: usize = 64;

/// Maximum length of the domain, in octets (RFC 5321 §4.5.3.1.2).
const MAX_DOMAIN: usize = 255;

/// Reasons an address token fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("missing '@' separator")]
    MissingAtSign,

    #[error("local part exceeds {MAX_LOCAL_PART} octets")]
    LocalPartTooLong,

    #[error("domain exceeds {MAX_DOMAIN} octets")]
    DomainTooLong,

    #[error("invalid local part: {0}")]
    InvalidLocalPart(String),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("domain must contain at least one dot")]
    DomainWithoutDot,
}

/// A validated, case-normalized email address.
///
/// Construction goes through [`Address::parse`], so a value of this
/// type always holds a syntactically valid `local@domain` pair in
/// lowercase form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    local_part: String,
    domain: String,
}

impl Address {
    /// Parses and case-normalizes a single address token.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] describing the first violated rule.
    pub fn parse(token: &str) -> Result<Self, AddressError> {
        let token = token.trim();

        if token.is_empty() {
            return Err(AddressError::Empty);
        }

        let at = token.rfind('@').ok_or(AddressError::MissingAtSign)?;
        let (local_part, domain) = (&token[..at], &token[at + 1..]);

        if local_part.len() > MAX_LOCAL_PART {
            return Err(AddressError::LocalPartTooLong);
        }
        if domain.len() > MAX_DOMAIN {
            return Err(AddressError::DomainTooLong);
        }

        validate_local_part(local_part)?;
        validate_domain(domain)?;

        Ok(Self {
            local_part: local_part.to_ascii_lowercase(),
            domain: domain.to_ascii_lowercase(),
        })
    }

    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// Validate a Dot-string: Atom *("." Atom)
fn validate_local_part(input: &str) -> Result<(), AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidLocalPart("empty local part".into()));
    }

    if input.starts_with('.') || input.ends_with('.') {
        return Err(AddressError::InvalidLocalPart(
            "local part cannot start or end with '.'".into(),
        ));
    }

    for atom in input.split('.') {
        if atom.is_empty() {
            return Err(AddressError::InvalidLocalPart(
                "local part cannot contain consecutive dots".into(),
            ));
        }
        if let Some(ch) = atom.chars().find(|&ch| !is_atext(ch)) {
            return Err(AddressError::InvalidLocalPart(format!(
                "invalid character '{ch}'"
            )));
        }
    }

    Ok(())
}

/// Validate a Domain: sub-domain 1*("." sub-domain)
fn validate_domain(input: &str) -> Result<(), AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidDomain("empty domain".into()));
    }

    if input.starts_with('.') || input.ends_with('.') {
        return Err(AddressError::InvalidDomain(
            "domain cannot start or end with '.'".into(),
        ));
    }

    let mut labels = 0usize;
    for label in input.split('.') {
        labels += 1;
        validate_label(label)?;
    }

    if labels < 2 {
        return Err(AddressError::DomainWithoutDot);
    }

    Ok(())
}

/// Validate a sub-domain: Let-dig [Ldh-str]
fn validate_label(label: &str) -> Result<(), AddressError> {
    if label.is_empty() {
        return Err(AddressError::InvalidDomain(
            "domain cannot contain consecutive dots".into(),
        ));
    }

    let first = label.chars().next();
    let last = label.chars().last();
    if first.is_none_or(|ch| !ch.is_ascii_alphanumeric())
        || last.is_none_or(|ch| !ch.is_ascii_alphanumeric())
    {
        return Err(AddressError::InvalidDomain(format!(
            "label '{label}' must start and end with a letter or digit"
        )));
    }

    if let Some(ch) = label.chars().find(|&ch| !ch.is_ascii_alphanumeric() && ch != '-') {
        return Err(AddressError::InvalidDomain(format!(
            "invalid character '{ch}' in label '{label}'"
        )));
    }

    Ok(())
}

/// atext = ALPHA / DIGIT / "!" / "#" / "$" / "%" / "&" / "'" / "*" /
///         "+" / "-" / "/" / "=" / "?" / "^" / "_" / "`" / "{" / "|" /
///         "}" / "~"
#[inline]
const fn is_atext(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}
