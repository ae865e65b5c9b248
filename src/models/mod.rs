pub mod auth;
pub mod bot;
pub mod cart;
pub mod catalog;
pub mod common;
pub mod order;
pub mod pagination;
pub mod verification;

pub use auth::*;
pub use bot::*;
pub use cart::*;
pub use catalog::*;
pub use common::*;
pub use order::*;
pub use pagination::*;
pub use verification::*;
