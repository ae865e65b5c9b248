pub mod auth_service;
pub mod bot_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;

pub use auth_service::*;
pub use bot_service::*;
pub use cart_service::*;
pub use catalog_service::*;
pub use order_service::*;
