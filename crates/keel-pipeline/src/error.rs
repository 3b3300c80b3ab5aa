//! # Pipeline Error Types
//!
//! Error types for the pipeline's own fallible edges: role lookups and the
//! remote reporting endpoint. Failures handled BY the pipeline become
//! [`keel_core::AppError`] records instead; these enums cover the pipeline's
//! infrastructure, not the errors it processes.

use thiserror::Error;

/// Role lookup failures.
///
/// The resolver never propagates these: every variant degrades to `Viewer`.
/// They exist so `RoleLookup` implementations can say what went wrong in the
/// log line.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The tenant record is missing a field the lookup needs.
    #[error("Malformed tenant record: {0}")]
    MalformedTenant(String),

    /// The user record is missing a field the lookup needs.
    #[error("Malformed user record: {0}")]
    MalformedUser(String),

    /// The backing lookup call failed.
    #[error("Role lookup failed: {0}")]
    Failed(String),
}

/// Reporting endpoint failures. Logged and swallowed, never surfaced to the
/// caller of `handle`.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The request never completed.
    #[error("Report transport failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("Reporting endpoint returned status {0}")]
    Status(u16),

    /// The reporter was constructed with an unusable endpoint or client.
    #[error("Invalid reporter configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LookupError::MalformedTenant("missing created_by".into());
        assert_eq!(err.to_string(), "Malformed tenant record: missing created_by");

        let err = ReportError::Status(503);
        assert_eq!(err.to_string(), "Reporting endpoint returned status 503");
    }
}
