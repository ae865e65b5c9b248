pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod product_comment_images;
pub mod product_comments;
pub mod product_images;
pub mod products;
pub mod users;
pub mod verifications;

pub use cart_items as cart_item_entity;
pub use carts as cart_entity;
pub use categories as category_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use orders::OrderStatus;
pub use product_comment_images as product_comment_image_entity;
pub use product_comments as product_comment_entity;
pub use product_images as product_image_entity;
pub use products as product_entity;
pub use users as user_entity;
pub use verifications as verification_entity;
