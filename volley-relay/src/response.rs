//! SMTP reply parsing.

use crate::error::{ClientError, Result};

/// One line of a (possibly multi-line) SMTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    pub code: u16,
    /// `true` when the separator was a space, marking the final line.
    pub is_last: bool,
    pub message: String,
}

/// A complete SMTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Response {
    #[must_use]
    pub const fn new(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// All reply lines joined with newlines.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    /// 2xx reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// 3xx reply (e.g. 354 after DATA, 334 during AUTH).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// 4xx reply.
    #[must_use]
    pub const fn is_temporary_error(&self) -> bool {
        self.code >= 400 && self.code < 500
    }

    /// 5xx reply.
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code >= 500 && self.code < 600
    }

    /// Parses one reply line: `CODE[- ]text`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Parse`] when the line is not SMTP-shaped.
    pub fn parse_line(line: &str) -> Result<ResponseLine> {
        if line.len() < 3 {
            return Err(ClientError::Parse(format!(
                "reply line too short: {line:?}"
            )));
        }

        let code = line[..3]
            .parse::<u16>()
            .map_err(|_| ClientError::Parse(format!("invalid reply code in {line:?}")))?;

        let is_last = match line.as_bytes().get(3) {
            None | Some(b' ') => true,
            Some(b'-') => false,
            Some(&sep) => {
                return Err(ClientError::Parse(format!(
                    "invalid separator {:?} in {line:?}",
                    sep as char
                )));
            }
        };

        let message = line.get(4..).unwrap_or_default().to_string();

        Ok(ResponseLine {
            code,
            is_last,
            message,
        })
    }

    /// Tries to parse one complete reply from the front of `buffer`.
    ///
    /// Returns the reply and the number of bytes consumed, or `None`
    /// when the buffer does not yet hold a full reply.
    ///
    /// # Errors
    ///
    /// [`ClientError::Parse`] for malformed lines or code mismatches
    /// within a multi-line reply.
    pub fn parse_reply(buffer: &[u8]) -> Result<Option<(Self, usize)>> {
        let text = std::str::from_utf8(buffer)?;

        let mut lines = Vec::new();
        let mut code = None;
        let mut consumed = 0;

        loop {
            let rest = &text[consumed..];
            let Some(end) = rest.find('\n') else {
                // Incomplete line, wait for more data.
                return Ok(None);
            };

            let line = rest[..end].trim_end_matches('\r');
            consumed += end + 1;

            if line.is_empty() {
                continue;
            }

            let parsed = Self::parse_line(line)?;
            match code {
                None => code = Some(parsed.code),
                Some(code) if code != parsed.code => {
                    return Err(ClientError::Parse(format!(
                        "code mismatch in multi-line reply: {code} then {}",
                        parsed.code
                    )));
                }
                Some(_) => {}
            }

            lines.push(parsed.message);

            if parsed.is_last {
                let Some(code) = code else {
                    return Ok(None);
                };
                return Ok(Some((Self::new(code, lines), consumed)));
            }
        }
    }
}
