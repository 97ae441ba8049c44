use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use akiba_models::FieldErrors;
use serde::Serialize;
use thiserror::Error;

/// Outcome classes exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Conflict,
    InvalidCredentials,
    Unauthorized,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input")]
    InvalidInput(FieldErrors),

    #[error("account already exists")]
    Conflict(FieldErrors),

    /// Wrong password, unknown login and disabled account all look the same.
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("account not found")]
    NotFound,

    /// Store, hash and signing failures. The cause is for logs only.
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl AuthError {
    pub fn internal(err: impl Into<anyhow::Error>, context: &'static str) -> Self {
        AuthError::Internal(err.into().context(context))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidInput(_) => ErrorKind::InvalidInput,
            AuthError::Conflict(_) => ErrorKind::Conflict,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AuthError::InvalidInput(fields) | AuthError::Conflict(fields) => Some(fields),
            _ => None,
        }
    }

    fn code_and_message(&self) -> (&'static str, &'static str) {
        match self.kind() {
            ErrorKind::InvalidInput => ("validation_error", "invalid request payload"),
            ErrorKind::Conflict => ("user_exists", "user already exists"),
            ErrorKind::InvalidCredentials => ("invalid_credentials", "invalid login or password"),
            // An unknown account behind a valid token is reported as unauthenticated.
            ErrorKind::Unauthorized | ErrorKind::NotFound => ("unauthorized", "unauthorized"),
            ErrorKind::Internal => ("internal_error", "internal server error"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

/// `{"error": {"code", "message", "fields"?}}`
pub fn error_response(status: StatusCode, code: &str, message: &str, fields: Option<&FieldErrors>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorEnvelope {
        error: ErrorBody { code, message, fields },
    })
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidCredentials | ErrorKind::Unauthorized | ErrorKind::NotFound => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AuthError::Internal(cause) = self {
            tracing::error!(error = %format!("{:#}", cause), "Request failed with internal error");
        }
        let (code, message) = self.code_and_message();
        error_response(self.status_code(), code, message, self.field_errors())
    }
}
