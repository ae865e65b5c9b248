use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::OrderService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(OrderQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders, newest first"),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_orders(
    service: web::Data<OrderService>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    respond!(
        service.list_orders(query.into_inner()).await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_order(service: web::Data<OrderService>, path: web::Path<i64>) -> Result<HttpResponse> {
    respond!(service.get_order(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = CreateOrderRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Created", body = OrderResponse))
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    req: HttpRequest,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    respond!(
        service.create_order(request.into_inner(), user_id).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = OrderResponse))
)]
pub async fn update_order(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
    request: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_order(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_order(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_order(path.into_inner()).await)
}

#[utoipa::path(
    get,
    path = "/order-items",
    tag = "order",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Order items"))
)]
pub async fn list_order_items(
    service: web::Data<OrderService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_items(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/order-items/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order item id")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Order item", body = OrderItemResponse))
)]
pub async fn get_order_item(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(service.get_item(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/order-items",
    tag = "order",
    request_body = CreateOrderItemRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Created", body = OrderItemResponse))
)]
pub async fn create_order_item(
    service: web::Data<OrderService>,
    request: web::Json<CreateOrderItemRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_item(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/order-items/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order item id")),
    request_body = UpdateOrderItemRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = OrderItemResponse))
)]
pub async fn update_order_item(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
    request: web::Json<UpdateOrderItemRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_item(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/order-items/{id}",
    tag = "order",
    params(("id" = i64, Path, description = "Order item id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_order_item(
    service: web::Data<OrderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_item(path.into_inner()).await)
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(list_orders))
            .route("", web::post().to(create_order))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::put().to(update_order))
            .route("/{id}", web::patch().to(update_order))
            .route("/{id}", web::delete().to(delete_order)),
    )
    .service(
        web::scope("/order-items")
            .route("", web::get().to(list_order_items))
            .route("", web::post().to(create_order_item))
            .route("/{id}", web::get().to(get_order_item))
            .route("/{id}", web::put().to(update_order_item))
            .route("/{id}", web::patch().to(update_order_item))
            .route("/{id}", web::delete().to(delete_order_item)),
    );
}
