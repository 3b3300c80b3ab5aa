//! # Error Taxonomy
//!
//! Normalized error records for the error/action pipeline.
//!
//! ## Two Orthogonal Axes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Error Taxonomy                                   │
//! │                                                                         │
//! │  Category (source)             Severity (urgency)                       │
//! │  ─────────────────             ──────────────────                       │
//! │  Api        backend failure    Info       notice only                   │
//! │  Validation bad field input    Warning    degraded, recoverable         │
//! │  Network    connectivity       Error      operation failed              │
//! │  Unknown    anything else      Critical   demands attention, sticky     │
//! │                                                                         │
//! │  Retryable:  Api, Network - and never when severity is Critical         │
//! │  Never retryable:  Validation, Unknown                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`AppError`] is what every failure becomes after classification: a unique
//! id, a message, the two axes, an opaque details map, and a timestamp. The
//! pipeline holds these in an append-only in-memory list for the session;
//! nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// =============================================================================
// Severity
// =============================================================================

/// Urgency classification, independent of category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Lenient slug parse for severity values carried inside failure
    /// payloads. Unknown slugs are `None`, not an error: classification
    /// stays total and falls back to its defaults.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Category
// =============================================================================

/// Functional classification of a failure's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// HTTP/backend failure, carrying status code, endpoint, and method.
    Api,
    /// Field-level input failure, carrying field, value, and constraint.
    Validation,
    /// Connectivity or timeout failure.
    Network,
    /// Fallback for anything unclassifiable.
    Unknown,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Api => "api",
            Category::Validation => "validation",
            Category::Network => "network",
            Category::Unknown => "unknown",
        }
    }

    /// Whether failures of this category may be retried at all.
    ///
    /// Validation failures will fail identically on every attempt, and
    /// unknown failures give no evidence a retry could succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Category::Api | Category::Network)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AppError
// =============================================================================

/// The pipeline's normalized error record.
///
/// Produced by [`classify`](crate::classify::classify) from any failure
/// shape. Construction generates the unique id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppError {
    /// Unique id (UUID v4). Doubles as the notification dedupe key.
    pub id: Uuid,
    /// Human-readable message.
    pub message: String,
    pub severity: Severity,
    pub category: Category,
    /// Opaque structured context (status codes, field names, attempt counts).
    pub details: Map<String, Value>,
    /// Rendered source chain, when the failure carried one.
    pub stack: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    /// Creates a new record with a fresh id and the current time.
    pub fn new(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        AppError {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            category,
            details: Map::new(),
            stack: None,
            timestamp: Utc::now(),
        }
    }

    /// Builder-style detail insertion.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Builder-style stack attachment.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The retryability predicate consulted by the retry loop.
    ///
    /// Category must be retryable AND severity must not be `Critical`.
    pub const fn is_retryable(&self) -> bool {
        self.category.is_retryable() && !matches!(self.severity, Severity::Critical)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}] {}", self.category, self.severity, self.message)
    }
}

// =============================================================================
// RawFailure
// =============================================================================

/// Any failure shape the pipeline can be handed.
///
/// The UI layer surfaces failures as strings, structured payloads from REST
/// responses, or real error values. Classification is total over all of
/// these; see [`classify`](crate::classify::classify).
#[derive(Debug)]
pub enum RawFailure {
    /// Nothing usable was carried (the null/unit failure).
    Empty,
    /// A bare message.
    Message(String),
    /// A structured payload, typically a decoded REST error body.
    Value(Value),
    /// A real error value with a source chain.
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl RawFailure {
    /// Wraps a real error value.
    ///
    /// A constructor rather than a blanket `From<E: Error>` impl: the blanket
    /// would collide with the string conversions below under coherence.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RawFailure::Source(Box::new(err))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for RawFailure {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        RawFailure::Source(err)
    }
}

impl From<String> for RawFailure {
    fn from(message: String) -> Self {
        RawFailure::Message(message)
    }
}

impl From<&str> for RawFailure {
    fn from(message: &str) -> Self {
        RawFailure::Message(message.to_string())
    }
}

impl From<Value> for RawFailure {
    fn from(value: Value) -> Self {
        RawFailure::Value(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
