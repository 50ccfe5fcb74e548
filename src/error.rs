use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use sqlx::error::ErrorKind;

/// Errors surfaced to API callers. The display text is the response message.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

/// Failures reported by the persistence gateway.
#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key rejected the write.
    #[display(fmt = "unique constraint violated: {}", _0)]
    Conflict(String),
    /// A foreign key points at a row that does not exist.
    #[display(fmt = "foreign key violated: {}", _0)]
    MissingReference(String),
    #[display(fmt = "database error: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Classifies a database error. MySQL folds unique, foreign key and
    /// NOT NULL failures into SQLSTATE 23000, so the error number decides.
    fn from_database(kind: ErrorKind, message: &str) -> Self {
        match kind {
            ErrorKind::UniqueViolation => StoreError::Conflict(message.to_string()),
            ErrorKind::ForeignKeyViolation => StoreError::MissingReference(message.to_string()),
            _ => StoreError::Backend(message.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) => StoreError::from_database(db_err.kind(), db_err.message()),
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => ApiError::Conflict("Record already exists".to_string()),
            StoreError::MissingReference(_) => ApiError::validation("Referenced record does not exist"),
            StoreError::Backend(_) => ApiError::Internal,
        }
    }
}
