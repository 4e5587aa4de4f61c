use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::journal::repository::RepositoryError;
use crate::journal::workflow::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid form data: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Multipart(e) => {
                (StatusCode::BAD_REQUEST, format!("Invalid form data: {}", e))
            }
            AppError::Repository(e) => repository_response(e),
            AppError::Workflow(WorkflowError::Repository(e)) => repository_response(e),
            AppError::Workflow(e) => {
                tracing::error!("Workflow error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::Conflict { .. } => {
            (StatusCode::CONFLICT, "今日はすでに投稿済みです".to_string())
        }
        RepositoryError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
        e => {
            tracing::error!("Repository error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
