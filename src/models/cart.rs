use crate::entities::{cart_entity, cart_item_entity, product_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub product_slug: String,
    /// Effective unit price in cents (discount when set)
    pub product_price: i64,
    pub quantity: i64,
    pub added_at: Option<DateTime<Utc>>,
}

impl CartItemResponse {
    pub fn new(item: cart_item_entity::Model, product: &product_entity::Model) -> Self {
        Self {
            id: item.id,
            cart_id: item.cart_id,
            product_id: item.product_id,
            product_title: product.title.clone(),
            product_slug: product.slug.clone(),
            product_price: product.effective_price(),
            quantity: item.quantity,
            added_at: item.added_at,
        }
    }

    pub fn line_total(&self) -> i64 {
        self.product_price.saturating_mul(self.quantity)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
    pub is_active: bool,
    pub items: Vec<CartItemResponse>,
    pub total_items: i64,
    /// cents
    pub subtotal: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartResponse {
    pub fn new(cart: cart_entity::Model, items: Vec<CartItemResponse>) -> Self {
        let total_items = items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity));
        let subtotal = items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.line_total()));
        Self {
            id: cart.id,
            user_id: cart.user_id,
            session_key: cart.session_key,
            is_active: cart.is_active,
            items,
            total_items,
            subtotal,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCartRequest {
    /// Defaults to the authenticated user
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub session_key: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub cart_id: i64,
    pub product_id: i64,
    /// Defaults to 1
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// 0 removes the item
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, discount: Option<i64>) -> product_entity::Model {
        product_entity::Model {
            id: 1,
            title: "Green tea".into(),
            description: String::new(),
            image: None,
            count: 10,
            price,
            discount_price: discount,
            slug: "green-tea".into(),
        }
    }

    fn item(id: i64, product_id: i64, quantity: i64) -> cart_item_entity::Model {
        cart_item_entity::Model {
            id,
            cart_id: 1,
            product_id,
            quantity,
            added_at: None,
        }
    }

    #[test]
    fn test_cart_totals_use_discount_price() {
        let full = product(1000, None);
        let discounted = product(2000, Some(1500));
        let cart = cart_entity::Model {
            id: 1,
            user_id: Some(3),
            session_key: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        let items = vec![
            CartItemResponse::new(item(1, 1, 2), &full),
            CartItemResponse::new(item(2, 2, 3), &discounted),
        ];
        let resp = CartResponse::new(cart, items);
        assert_eq!(resp.total_items, 5);
        assert_eq!(resp.subtotal, 2 * 1000 + 3 * 1500);
    }

    #[test]
    fn test_cart_totals_clamp_huge_quantities() {
        let pricey = product(1000, None);
        let line = CartItemResponse::new(item(1, 1, i64::MAX / 2), &pricey);
        assert_eq!(line.line_total(), i64::MAX);

        let cart = cart_entity::Model {
            id: 2,
            user_id: None,
            session_key: Some("guest".into()),
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        let items = vec![line.clone(), CartItemResponse::new(item(2, 1, i64::MAX), &pricey)];
        let resp = CartResponse::new(cart, items);
        assert_eq!(resp.total_items, i64::MAX);
        assert_eq!(resp.subtotal, i64::MAX);
    }
}
