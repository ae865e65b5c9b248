use crate::entities::{
    category_entity, product_comment_entity, product_comment_image_entity, product_entity,
    product_image_entity,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------- categories ----------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub slug: String,
}

impl From<category_entity::Model> for CategoryResponse {
    fn from(m: category_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            image: m.image,
            slug: m.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub title: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub title: Option<String>,
    pub image: Option<String>,
}

// ---------- products ----------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: i64,
    pub product_id: i64,
    pub image: String,
}

impl From<product_image_entity::Model> for ProductImageResponse {
    fn from(m: product_image_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            image: m.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageRequest {
    pub product_id: i64,
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductCommentImageResponse {
    pub id: i64,
    pub comment_id: i64,
    pub image: String,
}

impl From<product_comment_image_entity::Model> for ProductCommentImageResponse {
    fn from(m: product_comment_image_entity::Model) -> Self {
        Self {
            id: m.id,
            comment_id: m.comment_id,
            image: m.image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductCommentImageRequest {
    pub comment_id: i64,
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductCommentResponse {
    pub id: i64,
    pub product_id: i64,
    pub user: String,
    pub rating: i16,
    pub comment_text: String,
    pub images: Vec<ProductCommentImageResponse>,
}

impl ProductCommentResponse {
    pub fn new(
        m: product_comment_entity::Model,
        images: Vec<product_comment_image_entity::Model>,
    ) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            user: m.user,
            rating: m.rating,
            comment_text: m.comment_text,
            images: images.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProductCommentRequest {
    pub product_id: i64,
    pub user: String,
    /// 1..=5, defaults to 1
    pub rating: Option<i16>,
    pub comment_text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductCommentRequest {
    pub user: Option<String>,
    pub rating: Option<i16>,
    pub comment_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub count: i64,
    /// cents
    pub price: i64,
    pub discount_price: Option<i64>,
    pub slug: String,
    pub images: Vec<ProductImageResponse>,
    pub comments: Vec<ProductCommentResponse>,
}

impl ProductResponse {
    pub fn new(
        m: product_entity::Model,
        images: Vec<ProductImageResponse>,
        comments: Vec<ProductCommentResponse>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            image: m.image,
            count: m.count,
            price: m.price,
            discount_price: m.discount_price,
            slug: m.slug,
            images,
            comments,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub count: Option<i64>,
    pub price: i64,
    pub discount_price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub count: Option<i64>,
    pub price: Option<i64>,
    pub discount_price: Option<i64>,
}
