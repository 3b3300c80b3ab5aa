//! # Failure Classification
//!
//! Turns any [`RawFailure`] into a well-formed [`AppError`].
//!
//! ## Classification Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Classification Decision Tree                         │
//! │                                                                         │
//! │  RawFailure::Value (structured payload)                                 │
//! │    ├── has "field" + "constraint"      ──►  Validation (warning)        │
//! │    ├── has "status"/"endpoint"/"method"──►  Api        (error)          │
//! │    ├── has "online" or "timeout"       ──►  Network    (error)          │
//! │    └── anything else                   ──►  Unknown    (error)          │
//! │                                                                         │
//! │  RawFailure::Source (real error)       ──►  Unknown, source chain kept  │
//! │  RawFailure::Message / Empty           ──►  Unknown                     │
//! │                                                                         │
//! │  TOTAL: every input produces an AppError. classify() never panics.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is checked before Api: a REST validation response often carries
//! a status code too, and the field/constraint shape is the more specific
//! signal.
//!
//! Structured payloads may carry explicit `severity` and `stack` fields;
//! a recognized severity slug replaces the branch default (this is how a
//! caller escalates a failure to `critical`), and a stack string is kept on
//! the record. Unrecognized severity slugs are ignored.

use crate::error::{AppError, Category, RawFailure, Severity};
use serde_json::{Map, Value};

/// Fallback message when a failure carried nothing usable.
const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Normalizes any failure into an [`AppError`].
///
/// Total over all [`RawFailure`] variants; never panics. The returned record
/// always has a fresh id and the current timestamp.
pub fn classify(raw: RawFailure) -> AppError {
    match raw {
        RawFailure::Empty => AppError::new(Category::Unknown, Severity::Error, UNKNOWN_MESSAGE),
        RawFailure::Message(message) => {
            let message = if message.trim().is_empty() {
                UNKNOWN_MESSAGE.to_string()
            } else {
                message
            };
            AppError::new(Category::Unknown, Severity::Error, message)
        }
        RawFailure::Source(err) => {
            let stack = render_source_chain(err.as_ref());
            AppError::new(Category::Unknown, Severity::Error, err.to_string()).with_stack(stack)
        }
        RawFailure::Value(value) => classify_value(value),
    }
}

/// Classifies a structured payload by its shape.
fn classify_value(value: Value) -> AppError {
    let Value::Object(fields) = value else {
        // Bare strings, numbers, arrays: render compactly and give up.
        let message = serde_json::to_string(&value)
            .unwrap_or_else(|_| UNKNOWN_MESSAGE.to_string());
        return AppError::new(Category::Unknown, Severity::Error, message);
    };

    let severity = str_of(&fields, "severity").and_then(Severity::from_slug);
    let stack = str_of(&fields, "stack").map(str::to_string);

    let mut err = if fields.contains_key("field") && fields.contains_key("constraint") {
        classify_validation(fields)
    } else if fields.contains_key("status")
        || fields.contains_key("endpoint")
        || fields.contains_key("method")
    {
        classify_api(fields)
    } else if fields.contains_key("online") || fields.contains_key("timeout") {
        classify_network(fields)
    } else {
        let message = message_of(&fields).unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());
        AppError::new(Category::Unknown, Severity::Error, message)
    };

    if let Some(severity) = severity {
        err.severity = severity;
    }
    err.stack = stack;
    err
}

fn classify_api(fields: Map<String, Value>) -> AppError {
    let message = message_of(&fields).unwrap_or_else(|| "API request failed".to_string());
    let mut err = AppError::new(Category::Api, Severity::Error, message);
    for key in ["status", "slug", "endpoint", "method"] {
        if let Some(value) = fields.get(key) {
            err.details.insert(key.to_string(), value.clone());
        }
    }
    err
}

fn classify_validation(fields: Map<String, Value>) -> AppError {
    let message = message_of(&fields).unwrap_or_else(|| {
        let field = str_of(&fields, "field").unwrap_or("input");
        let constraint = str_of(&fields, "constraint").unwrap_or("a constraint");
        format!("{field} failed {constraint}")
    });
    let mut err = AppError::new(Category::Validation, Severity::Warning, message);
    for key in ["field", "value", "constraint"] {
        if let Some(value) = fields.get(key) {
            err.details.insert(key.to_string(), value.clone());
        }
    }
    err
}

fn classify_network(fields: Map<String, Value>) -> AppError {
    let message = message_of(&fields).unwrap_or_else(|| "Network request failed".to_string());
    let mut err = AppError::new(Category::Network, Severity::Error, message);
    for key in ["online", "timeout"] {
        if let Some(value) = fields.get(key) {
            err.details.insert(key.to_string(), value.clone());
        }
    }
    err
}

/// Extracts a "message" string from a payload, if one is carried.
fn message_of(fields: &Map<String, Value>) -> Option<String> {
    str_of(fields, "message").map(str::to_string)
}

fn str_of<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// Renders an error's source chain into a stack-trace-like string.
fn render_source_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        lines.push(format!("caused by: {source}"));
        current = source.source();
    }
    lines.join("\n")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification_is_total() {
        // Every input shape yields a structurally valid record.
        let inputs = vec![
            RawFailure::Empty,
            RawFailure::Message(String::new()),
            RawFailure::Message("boom".to_string()),
            RawFailure::Value(json!(null)),
            RawFailure::Value(json!("a bare string")),
            RawFailure::Value(json!(42)),
            RawFailure::Value(json!([1, 2, 3])),
            RawFailure::Value(json!({})),
            RawFailure::from_error(std::io::Error::new(std::io::ErrorKind::Other, "io")),
        ];
        for raw in inputs {
            let err = classify(raw);
            assert!(!err.message.is_empty());
            assert!(!err.id.is_nil());
        }
    }

    #[test]
    fn test_native_error_is_unknown_with_error_severity() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = classify(RawFailure::from_error(io));
        assert_eq!(err.category, Category::Unknown);
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.message, "boom");
        assert!(err.stack.is_some());
    }

    #[test]
    fn test_api_shape() {
        let err = classify(
            json!({
                "message": "billing update rejected",
                "status": 502,
                "endpoint": "/api/billing",
                "method": "PUT",
            })
            .into(),
        );
        assert_eq!(err.category, Category::Api);
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.message, "billing update rejected");
        assert_eq!(err.details["status"], 502);
        assert_eq!(err.details["endpoint"], "/api/billing");
        assert_eq!(err.details["method"], "PUT");
    }

    #[test]
    fn test_validation_shape_wins_over_api_shape() {
        // Validation responses often carry a status too; field/constraint is
        // the more specific signal.
        let err = classify(
            json!({
                "status": 400,
                "field": "email",
                "value": "not-an-email",
                "constraint": "format",
            })
            .into(),
        );
        assert_eq!(err.category, Category::Validation);
        assert_eq!(err.severity, Severity::Warning);
        assert_eq!(err.details["field"], "email");
        assert_eq!(err.details["constraint"], "format");
        assert_eq!(err.message, "email failed format");
    }

    #[test]
    fn test_network_shape() {
        let err = classify(json!({ "online": false, "timeout": true }).into());
        assert_eq!(err.category, Category::Network);
        assert_eq!(err.details["online"], false);
        assert_eq!(err.details["timeout"], true);
        assert_eq!(err.message, "Network request failed");
    }

    #[test]
    fn test_explicit_severity_escalates_the_branch_default() {
        let err = classify(
            json!({
                "message": "payment ledger write failed",
                "status": 500,
                "severity": "critical",
            })
            .into(),
        );
        assert_eq!(err.category, Category::Api);
        assert_eq!(err.severity, Severity::Critical);
        // Critical is excluded from retry regardless of category.
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unrecognized_severity_keeps_the_default() {
        let err = classify(json!({ "status": 503, "severity": "fatal" }).into());
        assert_eq!(err.severity, Severity::Error);
    }

    #[test]
    fn test_payload_stack_is_kept() {
        let err = classify(
            json!({
                "message": "renderer crashed",
                "severity": "critical",
                "stack": "at draw()\nat frame()",
            })
            .into(),
        );
        assert_eq!(err.category, Category::Unknown);
        assert_eq!(err.severity, Severity::Critical);
        assert_eq!(err.stack.as_deref(), Some("at draw()\nat frame()"));
    }

    #[test]
    fn test_bare_string_falls_back_to_unknown() {
        let err = classify("something odd".into());
        assert_eq!(err.category, Category::Unknown);
        assert_eq!(err.message, "something odd");
    }

    #[test]
    fn test_empty_message_gets_a_fallback() {
        let err = classify("   ".into());
        assert_eq!(err.message, "An unknown error occurred");
    }

    #[test]
    fn test_source_chain_is_rendered() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "outer failed")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let inner = std::io::Error::new(std::io::ErrorKind::Other, "inner failed");
        let err = classify(RawFailure::from_error(Outer(inner)));
        let stack = err.stack.expect("stack rendered");
        assert!(stack.contains("outer failed"));
        assert!(stack.contains("caused by: inner failed"));
    }
}
