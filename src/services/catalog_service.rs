use std::collections::HashMap;

use crate::entities::{
    category_entity as categories, product_comment_entity as comments,
    product_comment_image_entity as comment_images, product_entity as products,
    product_image_entity as product_images,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{first_free_slug, slugify};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const CATEGORY_TITLE_MAX: usize = 150;
const PRODUCT_TITLE_MAX: usize = 200;
const COMMENT_USER_MAX: usize = 100;

fn validate_title(title: &str, max: usize) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::ValidationError("title may not be blank".to_string()));
    }
    if title.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "title must be at most {max} characters"
        )));
    }
    Ok(())
}

fn validate_money(field: &str, value: i64) -> AppResult<()> {
    if value < 0 {
        return Err(AppError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

fn validate_rating(rating: i16) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::ValidationError(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

/// Categories, products and everything hanging off a product.
#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    // ---------- categories ----------

    pub async fn list_categories(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<CategoryResponse>> {
        let query = categories::Entity::find().order_by_asc(categories::Column::Title);
        let total = query.clone().count(&self.pool).await?;
        let items = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(CategoryResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_category(&self, id: i64) -> AppResult<CategoryResponse> {
        Ok(self.find_category(id).await?.into())
    }

    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> AppResult<CategoryResponse> {
        validate_title(&request.title, CATEGORY_TITLE_MAX)?;
        self.ensure_category_title_free(&request.title, None).await?;
        let slug = self.unique_category_slug(&request.title).await?;

        let model = categories::ActiveModel {
            title: Set(request.title),
            image: Set(request.image),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Category {} created ({})", model.id, model.slug);
        Ok(model.into())
    }

    pub async fn update_category(
        &self,
        id: i64,
        request: UpdateCategoryRequest,
    ) -> AppResult<CategoryResponse> {
        let mut model = self.find_category(id).await?.into_active_model();
        if let Some(title) = request.title {
            validate_title(&title, CATEGORY_TITLE_MAX)?;
            self.ensure_category_title_free(&title, Some(id)).await?;
            model.title = Set(title);
        }
        if let Some(image) = request.image {
            model.image = Set(Some(image));
        }
        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        let res = categories::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        Ok(())
    }

    async fn find_category(&self, id: i64) -> AppResult<categories::Model> {
        categories::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    async fn ensure_category_title_free(&self, title: &str, except: Option<i64>) -> AppResult<()> {
        let mut query = categories::Entity::find().filter(categories::Column::Title.eq(title));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.count(&self.pool).await? > 0 {
            return Err(AppError::ValidationError(
                "category with this title already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn unique_category_slug(&self, title: &str) -> AppResult<String> {
        let base = slugify(title);
        let taken: Vec<String> = categories::Entity::find()
            .select_only()
            .column(categories::Column::Slug)
            .filter(categories::Column::Slug.starts_with(base.as_str()))
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(first_free_slug(&base, &taken))
    }

    // ---------- products ----------

    pub async fn list_products(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ProductResponse>> {
        let query = products::Entity::find().order_by_asc(products::Column::Title);
        let total = query.clone().count(&self.pool).await?;
        let models = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let items = self.hydrate_products(models).await?;
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_product(&self, id: i64) -> AppResult<ProductResponse> {
        let model = self.find_product(id).await?;
        let mut items = self.hydrate_products(vec![model]).await?;
        items
            .pop()
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    pub async fn create_product(&self, request: CreateProductRequest) -> AppResult<ProductResponse> {
        validate_title(&request.title, PRODUCT_TITLE_MAX)?;
        validate_money("price", request.price)?;
        if let Some(d) = request.discount_price {
            validate_money("discount_price", d)?;
        }
        let count = request.count.unwrap_or(0);
        if count < 0 {
            return Err(AppError::ValidationError(
                "count must not be negative".to_string(),
            ));
        }
        self.ensure_product_title_free(&request.title, None).await?;
        let slug = self.unique_product_slug(&request.title).await?;

        let model = products::ActiveModel {
            title: Set(request.title),
            description: Set(request.description),
            image: Set(request.image),
            count: Set(count),
            price: Set(request.price),
            discount_price: Set(request.discount_price),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Product {} created ({})", model.id, model.slug);
        Ok(ProductResponse::new(model, Vec::new(), Vec::new()))
    }

    pub async fn update_product(
        &self,
        id: i64,
        request: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        let mut model = self.find_product(id).await?.into_active_model();
        if let Some(title) = request.title {
            validate_title(&title, PRODUCT_TITLE_MAX)?;
            self.ensure_product_title_free(&title, Some(id)).await?;
            model.title = Set(title);
        }
        if let Some(description) = request.description {
            model.description = Set(description);
        }
        if let Some(image) = request.image {
            model.image = Set(Some(image));
        }
        if let Some(count) = request.count {
            if count < 0 {
                return Err(AppError::ValidationError(
                    "count must not be negative".to_string(),
                ));
            }
            model.count = Set(count);
        }
        if let Some(price) = request.price {
            validate_money("price", price)?;
            model.price = Set(price);
        }
        if let Some(discount) = request.discount_price {
            validate_money("discount_price", discount)?;
            model.discount_price = Set(Some(discount));
        }
        model.update(&self.pool).await?;
        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: i64) -> AppResult<()> {
        let res = products::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        Ok(())
    }

    pub(crate) async fn find_product(&self, id: i64) -> AppResult<products::Model> {
        products::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    async fn ensure_product_title_free(&self, title: &str, except: Option<i64>) -> AppResult<()> {
        let mut query = products::Entity::find().filter(products::Column::Title.eq(title));
        if let Some(id) = except {
            query = query.filter(products::Column::Id.ne(id));
        }
        if query.count(&self.pool).await? > 0 {
            return Err(AppError::ValidationError(
                "product with this title already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn unique_product_slug(&self, title: &str) -> AppResult<String> {
        let base = slugify(title);
        let taken: Vec<String> = products::Entity::find()
            .select_only()
            .column(products::Column::Slug)
            .filter(products::Column::Slug.starts_with(base.as_str()))
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(first_free_slug(&base, &taken))
    }

    /// Attaches gallery images and comments (with their images) in three
    /// batched queries.
    async fn hydrate_products(&self, models: Vec<products::Model>) -> AppResult<Vec<ProductResponse>> {
        let ids: Vec<i64> = models.iter().map(|p| p.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut images_by_product: HashMap<i64, Vec<ProductImageResponse>> = HashMap::new();
        for img in product_images::Entity::find()
            .filter(product_images::Column::ProductId.is_in(ids.clone()))
            .order_by_asc(product_images::Column::Id)
            .all(&self.pool)
            .await?
        {
            images_by_product
                .entry(img.product_id)
                .or_default()
                .push(img.into());
        }

        let comment_models = comments::Entity::find()
            .filter(comments::Column::ProductId.is_in(ids))
            .order_by_desc(comments::Column::Id)
            .all(&self.pool)
            .await?;
        let mut comments_by_product = self.attach_comment_images(comment_models).await?;

        Ok(models
            .into_iter()
            .map(|p| {
                let id = p.id;
                ProductResponse::new(
                    p,
                    images_by_product.remove(&id).unwrap_or_default(),
                    comments_by_product.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn attach_comment_images(
        &self,
        comment_models: Vec<comments::Model>,
    ) -> AppResult<HashMap<i64, Vec<ProductCommentResponse>>> {
        let comment_ids: Vec<i64> = comment_models.iter().map(|c| c.id).collect();
        let mut images_by_comment: HashMap<i64, Vec<comment_images::Model>> = HashMap::new();
        if !comment_ids.is_empty() {
            for img in comment_images::Entity::find()
                .filter(comment_images::Column::CommentId.is_in(comment_ids))
                .order_by_asc(comment_images::Column::Id)
                .all(&self.pool)
                .await?
            {
                images_by_comment.entry(img.comment_id).or_default().push(img);
            }
        }

        let mut by_product: HashMap<i64, Vec<ProductCommentResponse>> = HashMap::new();
        for c in comment_models {
            let images = images_by_comment.remove(&c.id).unwrap_or_default();
            by_product
                .entry(c.product_id)
                .or_default()
                .push(ProductCommentResponse::new(c, images));
        }
        Ok(by_product)
    }

    // ---------- product images ----------

    pub async fn list_product_images(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ProductImageResponse>> {
        let query = product_images::Entity::find().order_by_asc(product_images::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let items = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ProductImageResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_product_image(&self, id: i64) -> AppResult<ProductImageResponse> {
        Ok(self.find_product_image(id).await?.into())
    }

    pub async fn create_product_image(
        &self,
        request: ProductImageRequest,
    ) -> AppResult<ProductImageResponse> {
        self.find_product(request.product_id).await?;
        let model = product_images::ActiveModel {
            product_id: Set(request.product_id),
            image: Set(request.image),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model.into())
    }

    pub async fn update_product_image(
        &self,
        id: i64,
        request: ProductImageRequest,
    ) -> AppResult<ProductImageResponse> {
        let mut model = self.find_product_image(id).await?.into_active_model();
        self.find_product(request.product_id).await?;
        model.product_id = Set(request.product_id);
        model.image = Set(request.image);
        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn delete_product_image(&self, id: i64) -> AppResult<()> {
        let res = product_images::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Product image not found".to_string()));
        }
        Ok(())
    }

    async fn find_product_image(&self, id: i64) -> AppResult<product_images::Model> {
        product_images::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product image not found".to_string()))
    }

    // ---------- product comments ----------

    pub async fn list_comments(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ProductCommentResponse>> {
        let query = comments::Entity::find().order_by_desc(comments::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let models = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        let order: Vec<(i64, i64)> = models.iter().map(|c| (c.id, c.product_id)).collect();
        let mut by_product = self.attach_comment_images(models).await?;

        // restore the id-desc order across products
        let mut items = Vec::with_capacity(order.len());
        for (id, product_id) in order {
            if let Some(list) = by_product.get_mut(&product_id)
                && let Some(pos) = list.iter().position(|c| c.id == id)
            {
                items.push(list.remove(pos));
            }
        }
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_comment(&self, id: i64) -> AppResult<ProductCommentResponse> {
        let model = self.find_comment(id).await?;
        let images = comment_images::Entity::find()
            .filter(comment_images::Column::CommentId.eq(id))
            .order_by_asc(comment_images::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(ProductCommentResponse::new(model, images))
    }

    pub async fn create_comment(
        &self,
        request: CreateProductCommentRequest,
    ) -> AppResult<ProductCommentResponse> {
        let rating = request.rating.unwrap_or(1);
        validate_rating(rating)?;
        if request.user.trim().is_empty() || request.user.chars().count() > COMMENT_USER_MAX {
            return Err(AppError::ValidationError(format!(
                "user must be 1 to {COMMENT_USER_MAX} characters"
            )));
        }
        self.find_product(request.product_id).await?;

        let model = comments::ActiveModel {
            product_id: Set(request.product_id),
            user: Set(request.user),
            rating: Set(rating),
            comment_text: Set(request.comment_text),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(ProductCommentResponse::new(model, Vec::new()))
    }

    pub async fn update_comment(
        &self,
        id: i64,
        request: UpdateProductCommentRequest,
    ) -> AppResult<ProductCommentResponse> {
        let mut model = self.find_comment(id).await?.into_active_model();
        if let Some(user) = request.user {
            if user.trim().is_empty() || user.chars().count() > COMMENT_USER_MAX {
                return Err(AppError::ValidationError(format!(
                    "user must be 1 to {COMMENT_USER_MAX} characters"
                )));
            }
            model.user = Set(user);
        }
        if let Some(rating) = request.rating {
            validate_rating(rating)?;
            model.rating = Set(rating);
        }
        if let Some(text) = request.comment_text {
            model.comment_text = Set(text);
        }
        model.update(&self.pool).await?;
        self.get_comment(id).await
    }

    pub async fn delete_comment(&self, id: i64) -> AppResult<()> {
        let res = comments::Entity::delete_by_id(id).exec(&self.pool).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        Ok(())
    }

    async fn find_comment(&self, id: i64) -> AppResult<comments::Model> {
        comments::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    // ---------- comment images ----------

    pub async fn list_comment_images(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ProductCommentImageResponse>> {
        let query = comment_images::Entity::find().order_by_asc(comment_images::Column::Id);
        let total = query.clone().count(&self.pool).await?;
        let items = query
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ProductCommentImageResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_comment_image(&self, id: i64) -> AppResult<ProductCommentImageResponse> {
        Ok(self.find_comment_image(id).await?.into())
    }

    pub async fn create_comment_image(
        &self,
        request: ProductCommentImageRequest,
    ) -> AppResult<ProductCommentImageResponse> {
        self.find_comment(request.comment_id).await?;
        let model = comment_images::ActiveModel {
            comment_id: Set(request.comment_id),
            image: Set(request.image),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model.into())
    }

    pub async fn update_comment_image(
        &self,
        id: i64,
        request: ProductCommentImageRequest,
    ) -> AppResult<ProductCommentImageResponse> {
        let mut model = self.find_comment_image(id).await?.into_active_model();
        self.find_comment(request.comment_id).await?;
        model.comment_id = Set(request.comment_id);
        model.image = Set(request.image);
        Ok(model.update(&self.pool).await?.into())
    }

    pub async fn delete_comment_image(&self, id: i64) -> AppResult<()> {
        let res = comment_images::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Comment image not found".to_string()));
        }
        Ok(())
    }

    async fn find_comment_image(&self, id: i64) -> AppResult<comment_images::Model> {
        comment_images::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment image not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Phones", CATEGORY_TITLE_MAX).is_ok());
        assert!(validate_title("  ", CATEGORY_TITLE_MAX).is_err());
        assert!(validate_title(&"x".repeat(151), CATEGORY_TITLE_MAX).is_err());
        assert!(validate_title(&"x".repeat(200), PRODUCT_TITLE_MAX).is_ok());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money("price", 0).is_ok());
        assert!(validate_money("price", -1).is_err());
    }
}
