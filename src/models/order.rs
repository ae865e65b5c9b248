use crate::entities::{OrderStatus, order_entity, order_item_entity, product_entity};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

impl From<order_item_entity::Model> for OrderItemResponse {
    fn from(m: order_item_entity::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            product_id: m.product_id,
            quantity: m.quantity,
            unit_price: m.unit_price,
            total_price: m
                .total_price
                .unwrap_or(m.unit_price.saturating_mul(m.quantity)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub phone_number: Option<String>,
    /// cents
    pub total: i64,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub note: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderResponse {
    pub fn new(m: order_entity::Model, items: Vec<OrderItemResponse>) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            phone_number: m.phone_number,
            total: m.total,
            status: m.status,
            shipping_address: m.shipping_address,
            note: m.note,
            items,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Defaults to the authenticated user
    pub user_id: Option<i64>,
    pub phone_number: Option<String>,
    pub total: i64,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub phone_number: Option<String>,
    pub total: Option<i64>,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Defaults to the product's effective price
    pub unit_price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderItemRequest {
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
}

/// Unit price snapshot and line total. A missing or zero unit price falls
/// back to the product's current effective price.
pub fn price_order_line(
    unit_price: Option<i64>,
    product: &product_entity::Model,
    quantity: i64,
) -> AppResult<(i64, i64)> {
    let unit = match unit_price {
        Some(p) if p != 0 => p,
        _ => product.effective_price(),
    };
    let total = unit.checked_mul(quantity).ok_or_else(|| {
        AppError::ValidationError("order line total is out of range".to_string())
    })?;
    Ok((unit, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, discount: Option<i64>) -> product_entity::Model {
        product_entity::Model {
            id: 9,
            title: "Mug".into(),
            description: "Ceramic".into(),
            image: None,
            count: 3,
            price,
            discount_price: discount,
            slug: "mug".into(),
        }
    }

    #[test]
    fn test_price_order_line_defaults_to_effective_price() {
        assert_eq!(price_order_line(None, &product(500, None), 3).unwrap(), (500, 1500));
        assert_eq!(price_order_line(None, &product(500, Some(400)), 2).unwrap(), (400, 800));
        assert_eq!(price_order_line(Some(0), &product(500, None), 1).unwrap(), (500, 500));
    }

    #[test]
    fn test_price_order_line_keeps_explicit_price() {
        assert_eq!(price_order_line(Some(350), &product(500, None), 4).unwrap(), (350, 1400));
    }

    #[test]
    fn test_price_order_line_rejects_overflowing_total() {
        let result = price_order_line(None, &product(1000, None), i64::MAX / 2);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        let result = price_order_line(Some(i64::MAX), &product(1000, None), 2);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
    }
}
