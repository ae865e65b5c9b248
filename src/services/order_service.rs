use std::collections::HashMap;

use crate::entities::{
    OrderStatus, order_entity as orders, order_item_entity as order_items,
    product_entity as products,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Newest first, optionally narrowed to one status.
    pub async fn list_orders(&self, query: OrderQuery) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams {
            page: query.page,
            page_size: query.page_size,
        };

        let mut select = orders::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(orders::Column::Status.eq(status));
        }
        let select = select
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id);

        let total = select.clone().count(&self.pool).await?;
        let models = select
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let ids: Vec<i64> = models.iter().map(|o| o.id).collect();
        let mut items_by_order = self.load_items(ids).await?;
        let items = models
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                OrderResponse::new(o, items)
            })
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn get_order(&self, id: i64) -> AppResult<OrderResponse> {
        let order = self.find_order(id).await?;
        let items = self.load_items(vec![id]).await?.remove(&id).unwrap_or_default();
        Ok(OrderResponse::new(order, items))
    }

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        current_user: i64,
    ) -> AppResult<OrderResponse> {
        if request.total < 0 {
            return Err(AppError::ValidationError(
                "total must not be negative".to_string(),
            ));
        }
        let now = Utc::now();
        let model = orders::ActiveModel {
            user_id: Set(Some(request.user_id.unwrap_or(current_user))),
            phone_number: Set(request.phone_number),
            total: Set(request.total),
            status: Set(request.status.unwrap_or(OrderStatus::Pending)),
            shipping_address: Set(request.shipping_address),
            note: Set(request.note),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!(
            "Order {} created for user {:?} with status {}",
            model.id,
            model.user_id,
            model.status
        );
        Ok(OrderResponse::new(model, Vec::new()))
    }

    pub async fn update_order(&self, id: i64, request: UpdateOrderRequest) -> AppResult<OrderResponse> {
        let current = self.find_order(id).await?;
        let previous_status = current.status.clone();
        let mut model = current.into_active_model();

        if let Some(phone) = request.phone_number {
            model.phone_number = Set(Some(phone));
        }
        if let Some(total) = request.total {
            if total < 0 {
                return Err(AppError::ValidationError(
                    "total must not be negative".to_string(),
                ));
            }
            model.total = Set(total);
        }
        if let Some(status) = request.status {
            if status != previous_status {
                log::info!("Order {id} status {previous_status} -> {status}");
            }
            model.status = Set(status);
        }
        if let Some(address) = request.shipping_address {
            model.shipping_address = Set(Some(address));
        }
        if let Some(note) = request.note {
            model.note = Set(Some(note));
        }
        model.updated_at = Set(Some(Utc::now()));
        model.update(&self.pool).await?;
        self.get_order(id).await
    }

    pub async fn delete_order(&self, id: i64) -> AppResult<()> {
        let res = orders::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Order not found".to_string()));
        }
        Ok(())
    }

    // ---------- order items ----------

    pub async fn list_items(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<OrderItemResponse>> {
        let query = order_items::Entity::find().order_by_asc(order_items::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let items = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(OrderItemResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_item(&self, id: i64) -> AppResult<OrderItemResponse> {
        Ok(self.find_item(id).await?.into())
    }

    pub async fn create_item(&self, request: CreateOrderItemRequest) -> AppResult<OrderItemResponse> {
        validate_quantity(request.quantity)?;
        self.find_order(request.order_id).await?;
        let product = self.find_product(request.product_id).await?;
        let (unit_price, total_price) =
            price_order_line(request.unit_price, &product, request.quantity)?;

        let model = order_items::ActiveModel {
            order_id: Set(request.order_id),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            unit_price: Set(unit_price),
            total_price: Set(Some(total_price)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model.into())
    }

    /// Re-prices the line whenever quantity or unit price changes.
    pub async fn update_item(
        &self,
        id: i64,
        request: UpdateOrderItemRequest,
    ) -> AppResult<OrderItemResponse> {
        let item = self.find_item(id).await?;
        let quantity = request.quantity.unwrap_or(item.quantity);
        validate_quantity(quantity)?;
        let product = self.find_product(item.product_id).await?;
        let (unit_price, total_price) = price_order_line(
            Some(request.unit_price.unwrap_or(item.unit_price)),
            &product,
            quantity,
        )?;

        let mut active = item.into_active_model();
        active.quantity = Set(quantity);
        active.unit_price = Set(unit_price);
        active.total_price = Set(Some(total_price));
        Ok(active.update(&self.pool).await?.into())
    }

    pub async fn delete_item(&self, id: i64) -> AppResult<()> {
        let res = order_items::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Order item not found".to_string()));
        }
        Ok(())
    }

    async fn find_order(&self, id: i64) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    async fn find_item(&self, id: i64) -> AppResult<order_items::Model> {
        order_items::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))
    }

    async fn find_product(&self, id: i64) -> AppResult<products::Model> {
        products::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    async fn load_items(&self, order_ids: Vec<i64>) -> AppResult<HashMap<i64, Vec<OrderItemResponse>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut by_order: HashMap<i64, Vec<OrderItemResponse>> = HashMap::new();
        for item in order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?
        {
            by_order.entry(item.order_id).or_default().push(item.into());
        }
        Ok(by_order)
    }
}

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}
