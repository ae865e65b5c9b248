use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::VerificationState;

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the phone verification flow. The bot turns these into chat
/// replies; the login endpoint only ever surfaces `InvalidOrExpiredCode`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Start command has no verification token")]
    MissingStartToken,

    #[error("Invalid verification link")]
    InvalidToken,

    #[error("Verification link is expired or already used")]
    ExpiredOrUsedToken,

    #[error("No pending verification for this chat")]
    NoPendingVerification,

    #[error("Phone number does not match")]
    PhoneMismatch,

    #[error("Shared contact does not belong to the sender")]
    ForeignContact,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Cannot {action} a verification in state {from}")]
    IllegalTransition {
        from: VerificationState,
        action: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl AppError {
    fn parts(&self) -> (actix_web::http::StatusCode, &'static str, String) {
        use actix_web::http::StatusCode;

        match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone())
            }
            AppError::JwtError(err) => {
                log::warn!("Rejected token: {err}");
                (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_NOT_VALID",
                    "Token is invalid or expired".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string())
            }
            AppError::Verification(err) => {
                log::info!("Verification rejected: {err}");
                (StatusCode::BAD_REQUEST, "VERIFICATION_FAILED", err.to_string())
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR", msg.clone())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::Verification(_) => {
                actix_web::http::StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) | AppError::JwtError(_) => {
                actix_web::http::StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            AppError::Forbidden => actix_web::http::StatusCode::FORBIDDEN,
            AppError::ExternalApiError(_) => actix_web::http::StatusCode::BAD_GATEWAY,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "detail": message,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_verification_errors_are_bad_requests() {
        let err = AppError::from(VerificationError::InvalidOrExpiredCode);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid or expired code");
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AuthError("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
