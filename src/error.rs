//! Typed error model for the dashboard backend.
//!
//! The boundary needs exactly one distinction a bare transport error does
//! not carry: whether the upstream call timed out. Timeouts map to their
//! own gateway status and exit code, so they get their own variant;
//! everything else reqwest can fail with stays [`OcsError::Transport`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcsError {
    /// The upstream call exceeded the configured deadline.
    #[error("upstream request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Any other failure completing the upstream request. Always built
    /// through [`OcsError::from_reqwest`], which strips the request URL
    /// so the token query parameter cannot reach logs or error bodies.
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The inbound account id was missing or not an integer.
    #[error("invalid accountId: {0}")]
    InvalidAccountId(String),

    /// Missing or malformed environment configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OcsError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            OcsError::Timeout { timeout_secs }
        } else {
            // reqwest renders the full request URL in its message, and ours
            // carries the token as a query parameter. Drop the URL before
            // the error can be displayed anywhere.
            OcsError::Transport(err.without_url())
        }
    }
}
