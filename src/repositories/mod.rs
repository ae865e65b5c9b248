//! Storage seams shared by the HTTP endpoints and the chat bot.

pub mod account_repository;
pub mod verification_repository;

pub use account_repository::*;
pub use verification_repository::*;
