use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    /// Resources anyone may read; writes still need a token.
    read_only_resources: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/register",
                "/api/login",
                "/api/token/refresh",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/webhook/"],
            read_only_resources: vec![
                "/api/categories",
                "/api/products",
                "/api/product-images",
                "/api/product-comments",
                "/api/product-comment-images",
            ],
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        *method == Method::GET
            && self.read_only_resources.iter().any(|&resource| {
                path == resource
                    || path
                        .strip_prefix(resource)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_paths.is_public(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        let user_id = self
            .jwt_service
            .verify_access_token(token)
            .ok()
            .and_then(|claims| claims.sub.parse::<i64>().ok());

        match user_id {
            Some(user_id) => {
                req.extensions_mut().insert(user_id);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            None => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public(&Method::POST, "/api/register"));
        assert!(paths.is_public(&Method::POST, "/api/login"));
        assert!(paths.is_public(&Method::POST, "/api/token/refresh"));
        assert!(paths.is_public(&Method::POST, "/webhook/telegram"));
        assert!(paths.is_public(&Method::GET, "/swagger-ui/index.html"));

        assert!(paths.is_public(&Method::GET, "/api/products"));
        assert!(paths.is_public(&Method::GET, "/api/products/3"));
        assert!(paths.is_public(&Method::GET, "/api/product-comment-images/1"));
        assert!(!paths.is_public(&Method::POST, "/api/products"));
        assert!(!paths.is_public(&Method::DELETE, "/api/categories/1"));
        assert!(!paths.is_public(&Method::GET, "/api/productsx"));

        assert!(!paths.is_public(&Method::GET, "/api/orders"));
        assert!(!paths.is_public(&Method::GET, "/api/carts/1"));
    }

    #[actix_web::test]
    async fn test_injects_user_id() {
        let jwt = JwtService::new("mw-secret", 300, 600);
        let token = jwt.generate_access_token(42, "+1000").unwrap();
        let refresh = jwt.generate_refresh_token(42, "+1000").unwrap();

        let app = actix_test::init_service(
            App::new().wrap(AuthMiddleware::new(jwt)).route(
                "/api/orders",
                web::get().to(|req: actix_web::HttpRequest| async move {
                    let id = req.extensions().get::<i64>().copied().unwrap_or_default();
                    HttpResponse::Ok().body(id.to_string())
                }),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/orders")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "42");

        let req = actix_test::TestRequest::get().uri("/api/orders").to_request();
        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);

        // refresh tokens are not access tokens
        let req = actix_test::TestRequest::get()
            .uri("/api/orders")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), 401);
    }
}
