//! Error types for the simulation API.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was malformed or asked for something out of bounds.
    InvalidInput,
    /// The job did not finish before its deadline.
    Timeout,
    /// The simulation backend rejected the circuit or failed.
    BackendFailure,
    /// The worker pool and its queue are full.
    ServiceBusy,
    /// The service is shutting down.
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Timeout => "timeout",
            ErrorKind::BackendFailure => "backend_failure",
            ErrorKind::ServiceBusy => "service_busy",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::BackendFailure | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceBusy | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with a message that is safe to show clients.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendFailure, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceBusy, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// Result type for the service.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    message: &'a str,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.kind.as_str(),
            message: &self.message,
        });
        let mut response = (self.kind.status(), body).into_response();
        if self.kind == ErrorKind::ServiceBusy {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

impl From<qsimd_qasm::ParseError> for ServiceError {
    fn from(e: qsimd_qasm::ParseError) -> Self {
        ServiceError::invalid_input(format!("QASM parse error: {e}"))
    }
}

impl From<qsimd_ir::IrError> for ServiceError {
    fn from(e: qsimd_ir::IrError) -> Self {
        ServiceError::invalid_input(format!("invalid circuit: {e}"))
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::invalid_input(rejection.body_text())
    }
}
