pub mod code_generator;
pub mod jwt;
pub mod phone;
pub mod slug;

pub use code_generator::generate_six_digit_code;
pub use jwt::*;
pub use phone::*;
pub use slug::*;
