use std::collections::HashMap;

use crate::entities::{cart_entity as carts, cart_item_entity as cart_items, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct CartService {
    pool: DatabaseConnection,
}

impl CartService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_carts(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<CartResponse>> {
        let query = carts::Entity::find().order_by_desc(carts::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let models = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let ids: Vec<i64> = models.iter().map(|c| c.id).collect();
        let mut items_by_cart = self.load_items(ids).await?;
        let items = models
            .into_iter()
            .map(|c| {
                let items = items_by_cart.remove(&c.id).unwrap_or_default();
                CartResponse::new(c, items)
            })
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_cart(&self, id: i64) -> AppResult<CartResponse> {
        let cart = self.find_cart(id).await?;
        let items = self.load_items(vec![id]).await?.remove(&id).unwrap_or_default();
        Ok(CartResponse::new(cart, items))
    }

    /// `user_id` falls back to the caller.
    pub async fn create_cart(
        &self,
        request: CreateCartRequest,
        current_user: i64,
    ) -> AppResult<CartResponse> {
        let now = Utc::now();
        let model = carts::ActiveModel {
            user_id: Set(Some(request.user_id.unwrap_or(current_user))),
            session_key: Set(request.session_key),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Cart {} created for user {:?}", model.id, model.user_id);
        Ok(CartResponse::new(model, Vec::new()))
    }

    pub async fn update_cart(&self, id: i64, request: UpdateCartRequest) -> AppResult<CartResponse> {
        let mut model = self.find_cart(id).await?.into_active_model();
        if let Some(session_key) = request.session_key {
            model.session_key = Set(Some(session_key));
        }
        if let Some(is_active) = request.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Some(Utc::now()));
        model.update(&self.pool).await?;
        self.get_cart(id).await
    }

    pub async fn delete_cart(&self, id: i64) -> AppResult<()> {
        let res = carts::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Cart not found".to_string()));
        }
        Ok(())
    }

    // ---------- cart items ----------

    pub async fn list_items(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<CartItemResponse>> {
        let query = cart_items::Entity::find().order_by_desc(cart_items::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let models = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = self.with_products(models).await?;
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_item(&self, id: i64) -> AppResult<CartItemResponse> {
        let item = self.find_item(id).await?;
        let product = self.find_product(item.product_id).await?;
        Ok(CartItemResponse::new(item, &product))
    }

    /// Adding a product already in the cart bumps its quantity.
    pub async fn add_item(&self, request: AddCartItemRequest) -> AppResult<CartItemResponse> {
        let quantity = request.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.find_cart(request.cart_id).await?;
        let product = self.find_product(request.product_id).await?;

        let existing = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.eq(request.cart_id))
            .filter(cart_items::Column::ProductId.eq(request.product_id))
            .one(&self.pool)
            .await?;

        let item = match existing {
            Some(item) => {
                let new_quantity = merge_quantity(item.quantity, quantity)?;
                let mut active = item.into_active_model();
                active.quantity = Set(new_quantity);
                active.update(&self.pool).await?
            }
            None => {
                cart_items::ActiveModel {
                    cart_id: Set(request.cart_id),
                    product_id: Set(request.product_id),
                    quantity: Set(quantity),
                    added_at: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };
        self.touch_cart(request.cart_id).await?;
        Ok(CartItemResponse::new(item, &product))
    }

    /// Returns `None` when the quantity dropped to zero and the row was removed.
    pub async fn update_item(
        &self,
        id: i64,
        request: UpdateCartItemRequest,
    ) -> AppResult<Option<CartItemResponse>> {
        if request.quantity < 0 {
            return Err(AppError::ValidationError(
                "quantity must not be negative".to_string(),
            ));
        }
        let item = self.find_item(id).await?;
        let cart_id = item.cart_id;

        if request.quantity == 0 {
            cart_items::Entity::delete_by_id(id).exec(&self.pool).await?;
            self.touch_cart(cart_id).await?;
            return Ok(None);
        }

        let product = self.find_product(item.product_id).await?;
        let mut active = item.into_active_model();
        active.quantity = Set(request.quantity);
        let item = active.update(&self.pool).await?;
        self.touch_cart(cart_id).await?;
        Ok(Some(CartItemResponse::new(item, &product)))
    }

    pub async fn delete_item(&self, id: i64) -> AppResult<()> {
        let item = self.find_item(id).await?;
        cart_items::Entity::delete_by_id(id).exec(&self.pool).await?;
        self.touch_cart(item.cart_id).await?;
        Ok(())
    }

    async fn find_cart(&self, id: i64) -> AppResult<carts::Model> {
        carts::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))
    }

    async fn find_item(&self, id: i64) -> AppResult<cart_items::Model> {
        cart_items::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))
    }

    async fn find_product(&self, id: i64) -> AppResult<products::Model> {
        products::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    async fn touch_cart(&self, id: i64) -> AppResult<()> {
        carts::Entity::update_many()
            .col_expr(
                carts::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(carts::Column::Id.eq(id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_items(&self, cart_ids: Vec<i64>) -> AppResult<HashMap<i64, Vec<CartItemResponse>>> {
        if cart_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.is_in(cart_ids))
            .order_by_asc(cart_items::Column::Id)
            .all(&self.pool)
            .await?;

        let mut by_cart: HashMap<i64, Vec<CartItemResponse>> = HashMap::new();
        for item in self.with_products(models).await? {
            by_cart.entry(item.cart_id).or_default().push(item);
        }
        Ok(by_cart)
    }

    async fn with_products(&self, items: Vec<cart_items::Model>) -> AppResult<Vec<CartItemResponse>> {
        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let products: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let product = products.get(&item.product_id)?;
                Some(CartItemResponse::new(item, product))
            })
            .collect())
    }
}

/// Quantity after adding `added` units to a line that already holds `current`.
fn merge_quantity(current: i64, added: i64) -> AppResult<i64> {
    current.checked_add(added).ok_or_else(|| {
        AppError::ValidationError("cart item quantity is out of range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_quantity() {
        assert_eq!(merge_quantity(2, 3).unwrap(), 5);
        assert!(matches!(
            merge_quantity(i64::MAX, 1),
            Err(AppError::ValidationError(_))
        ));
    }
}
