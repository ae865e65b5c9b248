use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::CartService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/carts",
    tag = "cart",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Carts with items and totals"),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_carts(
    service: web::Data<CartService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_carts(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/carts/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart", body = CartResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_cart(service: web::Data<CartService>, path: web::Path<i64>) -> Result<HttpResponse> {
    respond!(service.get_cart(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/carts",
    tag = "cart",
    request_body = CreateCartRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Created", body = CartResponse))
)]
pub async fn create_cart(
    service: web::Data<CartService>,
    req: HttpRequest,
    request: web::Json<CreateCartRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    respond!(
        service.create_cart(request.into_inner(), user_id).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/carts/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart id")),
    request_body = UpdateCartRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = CartResponse))
)]
pub async fn update_cart(
    service: web::Data<CartService>,
    path: web::Path<i64>,
    request: web::Json<UpdateCartRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_cart(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/carts/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_cart(
    service: web::Data<CartService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_cart(path.into_inner()).await)
}

#[utoipa::path(
    get,
    path = "/cart-items",
    tag = "cart",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart items"))
)]
pub async fn list_cart_items(
    service: web::Data<CartService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_items(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/cart-items/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart item id")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart item", body = CartItemResponse))
)]
pub async fn get_cart_item(
    service: web::Data<CartService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(service.get_item(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/cart-items",
    tag = "cart",
    request_body = AddCartItemRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Added, or quantity increased", body = CartItemResponse),
        (status = 400, description = "Invalid quantity", body = ErrorBody)
    )
)]
pub async fn add_cart_item(
    service: web::Data<CartService>,
    request: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.add_item(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/cart-items/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated", body = CartItemResponse),
        (status = 204, description = "Quantity 0 removed the item")
    )
)]
pub async fn update_cart_item(
    service: web::Data<CartService>,
    path: web::Path<i64>,
    request: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse> {
    match service
        .update_item(path.into_inner(), request.into_inner())
        .await
    {
        Ok(Some(item)) => Ok(HttpResponse::Ok().json(ApiResponse::success(item))),
        Ok(None) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart-items/{id}",
    tag = "cart",
    params(("id" = i64, Path, description = "Cart item id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_cart_item(
    service: web::Data<CartService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_item(path.into_inner()).await)
}

pub fn cart_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/carts")
            .route("", web::get().to(list_carts))
            .route("", web::post().to(create_cart))
            .route("/{id}", web::get().to(get_cart))
            .route("/{id}", web::put().to(update_cart))
            .route("/{id}", web::patch().to(update_cart))
            .route("/{id}", web::delete().to(delete_cart)),
    )
    .service(
        web::scope("/cart-items")
            .route("", web::get().to(list_cart_items))
            .route("", web::post().to(add_cart_item))
            .route("/{id}", web::get().to(get_cart_item))
            .route("/{id}", web::put().to(update_cart_item))
            .route("/{id}", web::patch().to(update_cart_item))
            .route("/{id}", web::delete().to(delete_cart_item)),
    );
}
