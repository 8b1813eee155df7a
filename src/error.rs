use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// The main error type for the charge mock
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Validation failed: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl MockError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code used in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand to clients.
    ///
    /// Server errors are reduced to a generic message; the detail only goes
    /// to the server log.
    pub fn safe_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound(_) => "Not Found".to_string(),
            Self::Conflict(msg) => msg.clone(),
            Self::Storage(_) | Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }

    /// The platform's `errors` payload for this error.
    fn errors_payload(&self) -> Value {
        match self {
            Self::Validation {
                field: Some(field),
                message,
            } => json!({ field.as_str(): [message] }),
            _ => Value::String(self.safe_message()),
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(json!({ "errors": self.errors_payload() }))).into_response()
    }
}

impl async_graphql::ErrorExtensions for MockError {
    fn extend(&self) -> async_graphql::Error {
        if matches!(self, Self::Storage(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "GraphQL resolver failed");
        }
        let code = self.code();
        async_graphql::Error::new(self.safe_message()).extend_with(|_, e| e.set("code", code))
    }
}

/// Result type alias for the charge mock
pub type Result<T> = std::result::Result<T, MockError>;

impl From<serde_json::Error> for MockError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            MockError::validation(format!("Invalid JSON: {}", err))
        } else {
            MockError::Storage(format!("JSON serialization error: {}", err))
        }
    }
}

#[cfg(feature = "store-redis")]
impl From<redis::RedisError> for MockError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            MockError::Storage(format!("Redis timeout: {}", err))
        } else {
            MockError::Storage(format!("Redis error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::ErrorExtensions;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MockError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(MockError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(MockError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(MockError::storage("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(MockError::internal("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display() {
        let err = MockError::invalid_field("name", "can't be blank");
        assert_eq!(err.to_string(), "Validation failed: can't be blank");

        let err = MockError::not_found("charge 42");
        assert_eq!(err.to_string(), "Not found: charge 42");
    }

    #[tokio::test]
    async fn test_not_found_response_is_generic() {
        let response = MockError::not_found("recurring_application_charge:42").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"errors": "Not Found"}));
    }

    #[tokio::test]
    async fn test_field_validation_response() {
        let response = MockError::invalid_field("name", "can't be blank").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"errors": {"name": ["can't be blank"]}})
        );
    }

    #[tokio::test]
    async fn test_storage_error_hides_details() {
        let response = MockError::storage("connection refused on 10.0.0.3").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({"errors": "Internal Server Error"}));
    }

    #[test]
    fn test_graphql_extension_code() {
        let err = MockError::validation("lineItems must not be empty").extend();
        assert_eq!(err.message, "lineItems must not be empty");
        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("VALIDATION_ERROR")));
    }

    #[test]
    fn test_serde_json_syntax_error_is_validation() {
        let err: MockError = serde_json::from_str::<Value>("{not json").unwrap_err().into();
        assert!(matches!(err, MockError::Validation { .. }));
    }
}
