use crate::validate::ValidationError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlueprintError>;

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("Blueprint {} is not implemented", .key.as_deref().unwrap_or("<anonymous>"))]
    Unimplemented { key: Option<String> },

    #[error("Input validation failed: {0}")]
    InputValidation(ValidationError),

    #[error("Result validation failed: {0}")]
    ResultValidation(ValidationError),

    #[error("Fetch failed: {message}")]
    Fetch { status: Option<u16>, message: String },

    #[error("Unknown addon method: {name}")]
    UnknownMethod { name: String },

    #[error(transparent)]
    Logic(#[from] anyhow::Error),
}

impl BlueprintError {
    /// Build a logic failure from a message.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        BlueprintError::Logic(anyhow::anyhow!("{}", message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BlueprintError::InputValidation(_) | BlueprintError::ResultValidation(_)
        )
    }
}

impl From<serde_json::Error> for BlueprintError {
    fn from(err: serde_json::Error) -> Self {
        BlueprintError::Logic(err.into())
    }
}

impl axum::response::IntoResponse for BlueprintError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, issues) = match &self {
            BlueprintError::InputValidation(v) | BlueprintError::ResultValidation(v) => {
                (StatusCode::BAD_REQUEST, Some(v.issues.clone()))
            }
            BlueprintError::Unimplemented { .. } => (StatusCode::NOT_IMPLEMENTED, None),
            BlueprintError::Fetch { .. } => (StatusCode::BAD_GATEWAY, None),
            BlueprintError::UnknownMethod { .. } | BlueprintError::Logic(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let mut body = json!({
            "statusCode": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(issues) = issues {
            body["issues"] = json!(issues);
        }

        (status, axum::Json(body)).into_response()
    }
}
