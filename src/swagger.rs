use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::OrderStatus;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::catalog::list_categories,
        handlers::catalog::get_category,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::list_product_images,
        handlers::catalog::get_product_image,
        handlers::catalog::create_product_image,
        handlers::catalog::update_product_image,
        handlers::catalog::delete_product_image,
        handlers::catalog::list_comments,
        handlers::catalog::get_comment,
        handlers::catalog::create_comment,
        handlers::catalog::update_comment,
        handlers::catalog::delete_comment,
        handlers::catalog::list_comment_images,
        handlers::catalog::get_comment_image,
        handlers::catalog::create_comment_image,
        handlers::catalog::update_comment_image,
        handlers::catalog::delete_comment_image,
        handlers::cart::list_carts,
        handlers::cart::get_cart,
        handlers::cart::create_cart,
        handlers::cart::update_cart,
        handlers::cart::delete_cart,
        handlers::cart::list_cart_items,
        handlers::cart::get_cart_item,
        handlers::cart::add_cart_item,
        handlers::cart::update_cart_item,
        handlers::cart::delete_cart_item,
        handlers::order::list_orders,
        handlers::order::get_order,
        handlers::order::create_order,
        handlers::order::update_order,
        handlers::order::delete_order,
        handlers::order::list_order_items,
        handlers::order::get_order_item,
        handlers::order::create_order_item,
        handlers::order::update_order_item,
        handlers::order::delete_order_item,
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            AuthResponse,
            RefreshRequest,
            RefreshResponse,
            CategoryResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductImageResponse,
            ProductImageRequest,
            ProductCommentResponse,
            CreateProductCommentRequest,
            UpdateProductCommentRequest,
            ProductCommentImageResponse,
            ProductCommentImageRequest,
            CartResponse,
            CartItemResponse,
            CreateCartRequest,
            UpdateCartRequest,
            AddCartItemRequest,
            UpdateCartItemRequest,
            OrderResponse,
            OrderItemResponse,
            OrderStatus,
            CreateOrderRequest,
            UpdateOrderRequest,
            CreateOrderItemRequest,
            UpdateOrderItemRequest,
            ApiError,
            ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Phone verification through the chat bot"),
        (name = "catalog", description = "Categories, products, images and comments"),
        (name = "cart", description = "Shopping carts"),
        (name = "order", description = "Orders and order lines"),
    ),
    info(
        title = "SCommerce Backend API",
        version = "1.0.0",
        description = "SCommerce shop REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/register"));
        assert!(doc.paths.paths.contains_key("/login"));
        assert!(doc.paths.paths.contains_key("/products/{id}"));
    }
}
