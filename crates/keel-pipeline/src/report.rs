//! # Remote Error Reporting
//!
//! Fire-and-forget submission of redacted error copies to a configured HTTP
//! endpoint. Reporting is config-gated (`enable_reporting`) and failures are
//! logged and swallowed; they never reach the caller of `handle`.
//!
//! ## Payload
//! ```text
//! POST <endpoint>
//! { "error": { id, message, severity, category, details,
//!              timestamp (ISO-8601), userAgent, url, stack? } }
//! ```
//!
//! The stack is STRIPPED unless severity is `critical`; routine errors keep
//! internals out of the wire payload.

use async_trait::async_trait;
use keel_core::{AppError, Category, Severity};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::ReportError;

/// Default request timeout for the HTTP reporter.
const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Payload
// =============================================================================

/// Host context stamped onto every report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    /// Client identifier, e.g. an app name/version pair.
    pub user_agent: String,
    /// Location the error was handled at, when the host tracks one.
    pub url: Option<String>,
}

impl Default for ReportContext {
    fn default() -> Self {
        ReportContext {
            user_agent: concat!("keel/", env!("CARGO_PKG_VERSION")).to_string(),
            url: None,
        }
    }
}

/// The redacted wire copy of an [`AppError`].
///
/// Field names follow the collector's wire shape (camelCase).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedError {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    pub details: Map<String, Value>,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    pub user_agent: String,
    pub url: Option<String>,
    /// Present only for `critical` severity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Top-level report body: `{ "error": { ... } }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: ReportedError,
}

impl ErrorReport {
    /// Builds the redacted copy of an error.
    pub fn new(err: &AppError, context: &ReportContext) -> Self {
        let stack = if err.severity == Severity::Critical {
            err.stack.clone()
        } else {
            None
        };
        ErrorReport {
            error: ReportedError {
                id: err.id.to_string(),
                message: err.message.clone(),
                severity: err.severity,
                category: err.category,
                details: err.details.clone(),
                timestamp: err.timestamp.to_rfc3339(),
                user_agent: context.user_agent.clone(),
                url: context.url.clone(),
                stack,
            },
        }
    }
}

// =============================================================================
// Reporter Seam
// =============================================================================

/// Submits reports to wherever the host collects them.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, report: &ErrorReport) -> Result<(), ReportError>;
}

/// HTTP reporter: POSTs the JSON body to a configured endpoint.
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            .build()
            .map_err(|e| ReportError::InvalidConfig(e.to_string()))?;
        Ok(HttpReporter {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ErrorReporter for HttpReporter {
    async fn report(&self, report: &ErrorReport) -> Result<(), ReportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_is_stripped_below_critical() {
        let err = AppError::new(Category::Api, Severity::Error, "boom")
            .with_stack("at line 1\nat line 2");
        let report = ErrorReport::new(&err, &ReportContext::default());
        assert!(report.error.stack.is_none());
    }

    #[test]
    fn test_critical_keeps_the_stack() {
        let err = AppError::new(Category::Unknown, Severity::Critical, "meltdown")
            .with_stack("at line 1");
        let report = ErrorReport::new(&err, &ReportContext::default());
        assert_eq!(report.error.stack.as_deref(), Some("at line 1"));
    }

    #[test]
    fn test_classified_critical_payload_reports_its_stack() {
        // An escalated payload carries its stack all the way to the wire.
        let err = keel_core::classify::classify(
            serde_json::json!({
                "message": "renderer crashed",
                "severity": "critical",
                "stack": "at draw()",
            })
            .into(),
        );
        let report = ErrorReport::new(&err, &ReportContext::default());
        assert_eq!(report.error.severity, Severity::Critical);
        assert_eq!(report.error.stack.as_deref(), Some("at draw()"));
    }

    #[test]
    fn test_wire_shape() {
        let err = AppError::new(Category::Api, Severity::Error, "bad gateway")
            .with_detail("status", 502);
        let context = ReportContext {
            user_agent: "keel-test/0.0".to_string(),
            url: Some("/settings/billing".to_string()),
        };
        let body = serde_json::to_value(ErrorReport::new(&err, &context))
            .expect("report serializes");

        assert_eq!(body["error"]["id"], err.id.to_string());
        assert_eq!(body["error"]["severity"], "error");
        assert_eq!(body["error"]["category"], "api");
        assert_eq!(body["error"]["details"]["status"], 502);
        assert_eq!(body["error"]["userAgent"], "keel-test/0.0");
        assert_eq!(body["error"]["url"], "/settings/billing");
        // Stripped stack is absent, not null.
        assert!(body["error"].get("stack").is_none());
        // Timestamp is ISO-8601.
        assert!(body["error"]["timestamp"]
            .as_str()
            .is_some_and(|t| t.contains('T')));
    }
}
