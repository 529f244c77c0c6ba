//! Path routing and JSON framing.
//!
//! Maps a method and URL to a handler and renders the outcome as a status code
//! plus JSON body. Socket handling lives in [`crate::server`], so everything
//! here can be driven directly from tests.
//!
//! Routes are accepted with or without an `/api` prefix:
//!
//! | Method | Path |
//! | --- | --- |
//! | POST | `/tasks/{id}/check-dependencies` |
//! | GET | `/tasks` |
//! | GET | `/tasks/{id}` |
//! | GET | `/tasks/{id}/dependencies` |
//! | GET | `/tasks/{id}/dependents` |
//! | GET | `/graph` |
//! | GET | `/graph/cycles` |
//! | GET | `/health` |

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use taskgraph::snapshot::SnapshotSource;
use tiny_http::Method;
use tracing::warn;

use crate::api::{self, ApiError, ApiErrorData, CheckDependenciesRequest};

/// Status code and JSON body produced for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Value,
}

impl Reply {
    /// Successful reply carrying `data` as the body.
    pub fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&ApiError::internal(format!(
                "Failed to serialize response: {e}"
            ))),
        }
    }

    /// Error reply with the error's status code and a `{code, message}` body.
    pub fn error(err: &ApiError) -> Self {
        let body = serde_json::to_value(ApiErrorData::from(err)).unwrap_or(Value::Null);
        Self {
            status: err.status_code(),
            body,
        }
    }

    fn from_result<T: Serialize>(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::ok(&data),
            Err(e) => Self::error(&e),
        }
    }
}

/// Strip the query string, the optional `/api` prefix and any trailing slash.
fn normalize(url: &str) -> &str {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    let path = match path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };
    let path = path.trim_end_matches('/');
    if path.is_empty() { "/" } else { path }
}

/// Parse a JSON request body.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("Request body is required"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))
}

/// Route one request.
///
/// `url` is the request target as received (path plus optional query).
/// Unknown routes produce a `NOT_FOUND` reply.
pub async fn dispatch(
    source: &dyn SnapshotSource,
    method: &Method,
    url: &str,
    body: &[u8],
) -> Reply {
    let path = normalize(url);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::Post, ["tasks", id, "check-dependencies"]) => {
            match parse_body::<CheckDependenciesRequest>(body) {
                Ok(request) => {
                    Reply::from_result(api::check_dependencies(source, id, &request).await)
                }
                Err(e) => {
                    warn!(task = %id, error = %e, "Rejected dependency check request");
                    Reply::error(&e)
                }
            }
        }
        (Method::Get, ["tasks"]) => Reply::from_result(api::list_tasks(source).await),
        (Method::Get, ["tasks", id]) => Reply::from_result(api::get_task(source, id).await),
        (Method::Get, ["tasks", id, "dependencies"]) => {
            Reply::from_result(api::get_dependencies(source, id).await)
        }
        (Method::Get, ["tasks", id, "dependents"]) => {
            Reply::from_result(api::get_dependents(source, id).await)
        }
        (Method::Get, ["graph"]) => Reply::from_result(api::get_graph(source).await),
        (Method::Get, ["graph", "cycles"]) => Reply::from_result(api::get_cycles(source).await),
        (Method::Get, ["health"]) => Reply::from_result(api::health(source).await),
        _ => Reply::error(&ApiError::not_found(format!(
            "API endpoint not found: {method} {path}"
        ))),
    }
}
