use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};

/// Wraps a service result in the success envelope, or renders the error.
macro_rules! respond {
    ($result:expr, $ok:expr) => {
        match $result {
            Ok(data) => Ok($ok.json(ApiResponse::success(data))),
            Err(e) => Ok(e.error_response()),
        }
    };
}

macro_rules! respond_deleted {
    ($result:expr) => {
        match $result {
            Ok(()) => Ok(HttpResponse::NoContent().finish()),
            Err(e) => Ok(e.error_response()),
        }
    };
}

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod telegram;

pub use auth::auth_config;
pub use cart::cart_config;
pub use catalog::catalog_config;
pub use order::order_config;
pub use telegram::{BotDispatcher, WebhookSecret, webhook_config};

/// User id placed in the request extensions by `AuthMiddleware`.
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
