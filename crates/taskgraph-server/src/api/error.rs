//! API error types with HTTP status code mapping

use serde::Serialize;

/// Error codes that map to HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or invalid request (400)
    BadRequest,
    /// Task or route not found (404)
    NotFound,
    /// Snapshot could not be loaded or the response could not be built (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Wire name of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// API error with code and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code (determines HTTP status)
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a bad request error
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: message.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
        }
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<taskgraph::error::Error> for ApiError {
    fn from(err: taskgraph::error::Error) -> Self {
        use taskgraph::error::Error;
        match err {
            Error::Validation(message) => Self::bad_request(message),
            Error::TaskNotFound(id) => Self::not_found(format!("Task not found: {id}")),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Error body sent to clients: `{ "code": ..., "message": ... }`
#[derive(Debug, Serialize)]
pub struct ApiErrorData {
    /// Error code string
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

impl From<&ApiError> for ApiErrorData {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code.as_str(),
            message: err.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use taskgraph::domain::TaskId;

    #[rstest]
    #[case(ApiError::bad_request("x"), 400, "BAD_REQUEST")]
    #[case(ApiError::not_found("x"), 404, "NOT_FOUND")]
    #[case(ApiError::internal("x"), 500, "INTERNAL_ERROR")]
    fn test_status_codes(#[case] err: ApiError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.code.as_str(), code);
    }

    #[test]
    fn test_library_errors_map_to_codes() {
        let validation = ApiError::from(taskgraph::error::Error::Validation("bad".into()));
        assert_eq!(validation, ApiError::bad_request("bad"));

        let missing = ApiError::from(taskgraph::error::Error::TaskNotFound(TaskId::new("t9")));
        assert_eq!(missing, ApiError::not_found("Task not found: t9"));

        let config = ApiError::from(taskgraph::error::Error::Config("broken".into()));
        assert_eq!(config.code, ErrorCode::Internal);
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ApiErrorData::from(&ApiError::not_found("gone"))).unwrap();
        assert_eq!(body, serde_json::json!({ "code": "NOT_FOUND", "message": "gone" }));
    }
}
