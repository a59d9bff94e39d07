use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub mod builtins;

pub use builtins::{FieldRule, Schema};

/// A single problem reported by a [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, empty for the value itself.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Structured failure returned by [`Validator::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Shorthand for a failure with one issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("value rejected");
        }
        let rendered: Vec<String> = self
            .issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.path, issue.message)
                }
            })
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Parse-or-fail validation capability.
///
/// A validator either accepts the value (possibly normalizing it) or rejects it
/// with a [`ValidationError`]. Any schema library can be plugged in by
/// implementing this trait; closures of the same shape implement it already.
///
/// # Example
/// ```
/// use blueprint::validate::{ValidationError, Validator};
/// use serde_json::{json, Value};
///
/// let positive = |value: Value| match value.as_i64() {
///     Some(n) if n > 0 => Ok(value),
///     _ => Err(ValidationError::single("", "expected a positive integer")),
/// };
/// assert!(positive.parse(json!(3)).is_ok());
/// assert!(positive.parse(json!(-3)).is_err());
/// ```
pub trait Validator: Send + Sync + 'static {
    fn parse(&self, value: Value) -> Result<Value, ValidationError>;
}

impl<F> Validator for F
where
    F: Fn(Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
{
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        self(value)
    }
}
