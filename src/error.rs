//! Error types shared by the remote clients.
//!
//! Every variant maps onto one category a tool caller can act on: a missing
//! credential, a transport problem (timeout, HTTP status, network), or a
//! rejection relayed from the remote service.

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of response-body characters kept in an [`Error::Http`].
pub const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required credential or endpoint is absent. No call was attempted.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Command timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build an [`Error::Http`], truncating the body for display.
    pub fn http(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            body: truncate_chars(body, MAX_ERROR_BODY_CHARS).to_string(),
        }
    }

    /// Extra diagnostic text for the caller, when there is any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Http { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    /// Map a transport error from a call that had a known deadline.
    pub fn from_request(err: reqwest::Error, deadline_secs: u64) -> Self {
        if err.is_timeout() {
            Error::Timeout { secs: deadline_secs }
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

/// Char-boundary safe prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
