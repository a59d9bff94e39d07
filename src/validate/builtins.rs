use crate::validate::{ValidationError, ValidationIssue, Validator};
use serde_json::{Map, Value};

/// What a single field of an object [`Schema`] must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    String,
    NonEmptyString,
    Number,
    Integer,
    Boolean,
    Any,
}

impl FieldRule {
    fn check(&self, value: &Value) -> Option<&'static str> {
        match self {
            FieldRule::String if !value.is_string() => Some("expected a string"),
            FieldRule::NonEmptyString => match value.as_str() {
                None => Some("expected a string"),
                Some(s) if s.is_empty() => Some("must not be empty"),
                Some(_) => None,
            },
            FieldRule::Number if !value.is_number() => Some("expected a number"),
            FieldRule::Integer if !(value.is_i64() || value.is_u64()) => {
                Some("expected an integer")
            }
            FieldRule::Boolean if !value.is_boolean() => Some("expected a boolean"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    rule: FieldRule,
    required: bool,
    default: Option<Value>,
}

/// A small object validator with per-field rules.
///
/// All fields are checked before failing, so the error lists every issue.
///
/// ```
/// use blueprint::validate::{Schema, Validator};
/// use serde_json::json;
///
/// let schema = Schema::object()
///     .required("name", blueprint::validate::FieldRule::NonEmptyString)
///     .optional_or("greeting", blueprint::validate::FieldRule::String, json!("hello"));
///
/// let parsed = schema.parse(json!({ "name": "ada" })).unwrap();
/// assert_eq!(parsed, json!({ "name": "ada", "greeting": "hello" }));
/// assert!(schema.parse(json!({ "name": "" })).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
    deny_unknown: bool,
}

impl Schema {
    pub fn object() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push(Field {
            name: name.into(),
            rule,
            required: true,
            default: None,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push(Field {
            name: name.into(),
            rule,
            required: false,
            default: None,
        });
        self
    }

    /// Optional field that is filled with `default` when absent.
    pub fn optional_or(mut self, name: impl Into<String>, rule: FieldRule, default: Value) -> Self {
        self.fields.push(Field {
            name: name.into(),
            rule,
            required: false,
            default: Some(default),
        });
        self
    }

    /// Reject keys that no field describes.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }
}

impl Validator for Schema {
    fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let mut record: Map<String, Value> = match value {
            Value::Object(map) => map,
            _ => return Err(ValidationError::single("", "expected an object")),
        };

        let mut issues = Vec::new();
        for field in &self.fields {
            match record.get(&field.name) {
                Some(Value::Null) | None => {
                    if let Some(default) = &field.default {
                        record.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        issues.push(ValidationIssue::new(&field.name, "is required"));
                    }
                }
                Some(present) => {
                    if let Some(message) = field.rule.check(present) {
                        issues.push(ValidationIssue::new(&field.name, message));
                    }
                }
            }
        }

        if self.deny_unknown {
            for key in record.keys() {
                if !self.fields.iter().any(|f| &f.name == key) {
                    issues.push(ValidationIssue::new(key, "unknown field"));
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(record))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_every_issue() {
        let schema = Schema::object()
            .required("name", FieldRule::NonEmptyString)
            .required("age", FieldRule::Integer)
            .optional("admin", FieldRule::Boolean);

        let err = schema
            .parse(json!({ "name": "", "age": 1.5, "admin": "yes" }))
            .unwrap_err();
        let paths: Vec<&str> = err.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "age", "admin"]);
    }

    #[test]
    fn missing_required_and_non_object() {
        let schema = Schema::object().required("id", FieldRule::Any);
        assert_eq!(
            schema.parse(json!({})).unwrap_err().issues[0].message,
            "is required"
        );
        assert_eq!(
            schema.parse(json!(5)).unwrap_err().issues[0].message,
            "expected an object"
        );
    }

    #[test]
    fn deny_unknown_fields() {
        let schema = Schema::object()
            .required("id", FieldRule::Number)
            .deny_unknown_fields();
        let err = schema.parse(json!({ "id": 1, "extra": true })).unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::new("extra", "unknown field")]);
        assert!(schema.parse(json!({ "id": 1 })).is_ok());
    }
}
