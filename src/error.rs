use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The client only ever sees `message`; `source` goes to the log.
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn forbidden() -> Self {
        AppError::Forbidden("Access denied".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "Not found",
            AppError::Conflict(_) => "Conflict",
            AppError::BadRequest(_) | AppError::Validation(_) => "Bad request",
            AppError::Internal { .. } => "Internal server error",
        }
    }
}

/// Builds a `map_err` adapter that logs the underlying failure and hides it
/// behind a fixed message.
pub fn internal<E>(message: &'static str) -> impl FnOnce(E) -> AppError
where
    E: Into<anyhow::Error>,
{
    move |e| {
        let source = e.into();
        error!(error = %source, "{}", message);
        AppError::Internal { message, source }
    }
}

/// Like [`internal`], but a unique-index violation becomes `Conflict(conflict)`.
pub fn conflict_or_internal(
    conflict: &'static str,
    message: &'static str,
) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::warn!(error = %db, "unique index rejected write");
            AppError::Conflict(conflict.into())
        }
        _ => internal(message)(e),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message: Value = match &self {
            AppError::Validation(errors) => json!(errors),
            other => json!(other.to_string()),
        };
        let body = Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
            "error": self.label(),
        }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub message: &'static str,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn done(message: &'static str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message,
            data: None,
        }
    }

    pub fn created(message: &'static str) -> Self {
        Self {
            status_code: StatusCode::CREATED.as_u16(),
            message,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
