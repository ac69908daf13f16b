use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::media::MediaError;
use crate::utils::{ApiResponse, error_codes};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("缓存错误: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("媒体服务错误: {0}")]
    Media(#[from] MediaError),

    #[error("令牌无效: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{}不存在", resource))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // 上游返回的客户端错误原样透传，其余视为网关错误
            AppError::Media(e) => match e.status() {
                Some(status) if status.is_client_error() => status,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> i32 {
        match self.status_code() {
            StatusCode::BAD_REQUEST => error_codes::VALIDATION_ERROR,
            StatusCode::CONFLICT => error_codes::CONFLICT,
            StatusCode::UNAUTHORIZED => error_codes::AUTH_FAILED,
            StatusCode::FORBIDDEN => error_codes::PERMISSION_DENIED,
            StatusCode::NOT_FOUND => error_codes::NOT_FOUND,
            StatusCode::BAD_GATEWAY => error_codes::UPSTREAM_ERROR,
            s if s.is_client_error() => error_codes::VALIDATION_ERROR,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let msg = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "数据库错误".to_string()
            }
            AppError::Cache(e) => {
                tracing::error!("Cache error: {:?}", e);
                "缓存服务错误".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "内部服务器错误".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ApiResponse::<()> {
            code: self.error_code(),
            msg,
            resp_data: None,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::not_found("课程").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_media_error_keeps_client_status() {
        let err = AppError::from(MediaError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "bad file".into(),
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = AppError::from(MediaError::Rejected {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "down".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), error_codes::UPSTREAM_ERROR);
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::not_found("章节").to_string(), "章节不存在");
    }
}
