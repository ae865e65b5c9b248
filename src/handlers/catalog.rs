use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};

// ---------- categories ----------

#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    params(PaginationParams),
    responses((status = 200, description = "Categories ordered by title"))
)]
pub async fn list_categories(
    service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_categories(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_category(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(service.get_category(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "catalog",
    request_body = CreateCategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn create_category(
    service: web::Data<CatalogService>,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_category(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = CategoryResponse))
)]
pub async fn update_category(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_category(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Category id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_category(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_category(path.into_inner()).await)
}

// ---------- products ----------

#[utoipa::path(
    get,
    path = "/products",
    tag = "catalog",
    params(PaginationParams),
    responses((status = 200, description = "Products with images and comments"))
)]
pub async fn list_products(
    service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_products(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_product(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(service.get_product(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "catalog",
    request_body = CreateProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn create_product(
    service: web::Data<CatalogService>,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_product(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = ProductResponse))
)]
pub async fn update_product(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_product(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_product(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_product(path.into_inner()).await)
}

// ---------- product images ----------

#[utoipa::path(
    get,
    path = "/product-images",
    tag = "catalog",
    params(PaginationParams),
    responses((status = 200, description = "Product images"))
)]
pub async fn list_product_images(
    service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_product_images(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/product-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    responses((status = 200, description = "Image", body = ProductImageResponse))
)]
pub async fn get_product_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(
        service.get_product_image(path.into_inner()).await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    post,
    path = "/product-images",
    tag = "catalog",
    request_body = ProductImageRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Created", body = ProductImageResponse))
)]
pub async fn create_product_image(
    service: web::Data<CatalogService>,
    request: web::Json<ProductImageRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_product_image(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/product-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    request_body = ProductImageRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = ProductImageResponse))
)]
pub async fn update_product_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<ProductImageRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_product_image(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/product-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_product_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_product_image(path.into_inner()).await)
}

// ---------- product comments ----------

#[utoipa::path(
    get,
    path = "/product-comments",
    tag = "catalog",
    params(PaginationParams),
    responses((status = 200, description = "Comments, newest first"))
)]
pub async fn list_comments(
    service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_comments(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/product-comments/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Comment id")),
    responses((status = 200, description = "Comment", body = ProductCommentResponse))
)]
pub async fn get_comment(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(service.get_comment(path.into_inner()).await, HttpResponse::Ok())
}

#[utoipa::path(
    post,
    path = "/product-comments",
    tag = "catalog",
    request_body = CreateProductCommentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created", body = ProductCommentResponse),
        (status = 400, description = "Invalid rating", body = ErrorBody)
    )
)]
pub async fn create_comment(
    service: web::Data<CatalogService>,
    request: web::Json<CreateProductCommentRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_comment(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/product-comments/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Comment id")),
    request_body = UpdateProductCommentRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = ProductCommentResponse))
)]
pub async fn update_comment(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<UpdateProductCommentRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_comment(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/product-comments/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Comment id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_comment(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_comment(path.into_inner()).await)
}

// ---------- comment images ----------

#[utoipa::path(
    get,
    path = "/product-comment-images",
    tag = "catalog",
    params(PaginationParams),
    responses((status = 200, description = "Comment images"))
)]
pub async fn list_comment_images(
    service: web::Data<CatalogService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    respond!(service.list_comment_images(&query).await, HttpResponse::Ok())
}

#[utoipa::path(
    get,
    path = "/product-comment-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    responses((status = 200, description = "Image", body = ProductCommentImageResponse))
)]
pub async fn get_comment_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond!(
        service.get_comment_image(path.into_inner()).await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    post,
    path = "/product-comment-images",
    tag = "catalog",
    request_body = ProductCommentImageRequest,
    security(("bearer_auth" = [])),
    responses((status = 201, description = "Created", body = ProductCommentImageResponse))
)]
pub async fn create_comment_image(
    service: web::Data<CatalogService>,
    request: web::Json<ProductCommentImageRequest>,
) -> Result<HttpResponse> {
    respond!(
        service.create_comment_image(request.into_inner()).await,
        HttpResponse::Created()
    )
}

#[utoipa::path(
    put,
    path = "/product-comment-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    request_body = ProductCommentImageRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Updated", body = ProductCommentImageResponse))
)]
pub async fn update_comment_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<ProductCommentImageRequest>,
) -> Result<HttpResponse> {
    respond!(
        service
            .update_comment_image(path.into_inner(), request.into_inner())
            .await,
        HttpResponse::Ok()
    )
}

#[utoipa::path(
    delete,
    path = "/product-comment-images/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Image id")),
    security(("bearer_auth" = [])),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_comment_image(
    service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond_deleted!(service.delete_comment_image(path.into_inner()).await)
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{id}", web::get().to(get_category))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::patch().to(update_category))
            .route("/{id}", web::delete().to(delete_category)),
    )
    .service(
        web::scope("/products")
            .route("", web::get().to(list_products))
            .route("", web::post().to(create_product))
            .route("/{id}", web::get().to(get_product))
            .route("/{id}", web::put().to(update_product))
            .route("/{id}", web::patch().to(update_product))
            .route("/{id}", web::delete().to(delete_product)),
    )
    .service(
        web::scope("/product-images")
            .route("", web::get().to(list_product_images))
            .route("", web::post().to(create_product_image))
            .route("/{id}", web::get().to(get_product_image))
            .route("/{id}", web::put().to(update_product_image))
            .route("/{id}", web::delete().to(delete_product_image)),
    )
    .service(
        web::scope("/product-comments")
            .route("", web::get().to(list_comments))
            .route("", web::post().to(create_comment))
            .route("/{id}", web::get().to(get_comment))
            .route("/{id}", web::put().to(update_comment))
            .route("/{id}", web::patch().to(update_comment))
            .route("/{id}", web::delete().to(delete_comment)),
    )
    .service(
        web::scope("/product-comment-images")
            .route("", web::get().to(list_comment_images))
            .route("", web::post().to(create_comment_image))
            .route("/{id}", web::get().to(get_comment_image))
            .route("/{id}", web::put().to(update_comment_image))
            .route("/{id}", web::delete().to(delete_comment_image)),
    );
}
