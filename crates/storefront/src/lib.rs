//! Boutique storefront library.
//!
//! Server-rendered boutique: catalog with category filters, product pages,
//! a session bag and wishlist, a printable catalog, login through the
//! backend-as-a-service, and an admin panel for products and menu visibility.
//!
//! The binary in `main.rs` only adds process concerns (config, tracing,
//! Sentry, shutdown) around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with all middleware applied.
///
/// Layers run outermost first: tracing span, request ID, CSP nonce, session,
/// then security headers closest to the handlers.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::Product;
    use crate::catalog::tests::product;
    use crate::config::tests::test_config;

    fn test_app() -> Router {
        app(AppState::new(test_config()))
    }

    /// App whose catalog holds `products` (in this order) with the backend down.
    async fn seeded_app(products: Vec<Product>) -> Router {
        let state = AppState::new(test_config());
        for product in products.into_iter().rev() {
            state.catalog().apply_insert(product).await;
        }
        app(state)
    }

    fn sold(mut product: Product) -> Product {
        product.sold = true;
        product
    }

    /// `name=value` part of the session cookie set by a response.
    fn session_cookie(response: &axum::response::Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        request
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_backend() {
        let response = test_app().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_security_headers_are_set() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        let csp = headers[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.contains("'nonce-"));
        assert!(csp.contains("http://127.0.0.1:9"));
    }

    #[tokio::test]
    async fn test_catalog_renders_while_backend_is_down() {
        let response = test_app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("href=\"/bag\""));
    }

    #[tokio::test]
    async fn test_hidden_menu_cookie_hides_nav_link() {
        let request = Request::builder()
            .uri("/")
            .header(header::COOKIE, "hidden_menu=bag.wishlist")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        let body = body_text(response).await;
        assert!(!body.contains("href=\"/bag\""));
        assert!(!body.contains("href=\"/wishlist\""));
        assert!(body.contains("href=\"/categories\""));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let response = test_app().oneshot(get("/products/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_adding_unknown_product_is_not_found() {
        let response = test_app()
            .oneshot(form_post("/bag/add", "product_id=42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_bag_checkout_redirects_to_bag() {
        let response = test_app()
            .oneshot(form_post("/bag/checkout", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/bag");
    }

    #[tokio::test]
    async fn test_printable_catalog_renders_empty() {
        let response = test_app()
            .oneshot(get("/catalog/print?category=Clothing&category=Bags"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_requires_login() {
        let response = test_app().oneshot(get("/admin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_menu_toggle_requires_admin() {
        let response = test_app()
            .oneshot(form_post("/admin/menu/toggle", "label=bag"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_account_requires_login() {
        let response = test_app().oneshot(get("/account")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_oauth_rejects_unlisted_provider() {
        let response = test_app()
            .oneshot(get("/auth/oauth/myspace"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?error=provider"
        );
    }

    #[tokio::test]
    async fn test_oauth_start_redirects_to_backend() {
        let response = test_app().oneshot(get("/auth/oauth/google")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("http://127.0.0.1:9/auth/v1/authorize?"));
        assert!(location.contains("code_challenge_method=s256"));
    }

    #[tokio::test]
    async fn test_callback_without_verifier_is_rejected() {
        let response = test_app()
            .oneshot(get("/auth/callback?code=abc"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?error=session"
        );
    }

    #[tokio::test]
    async fn test_empty_catalog_shows_showcase_gallery() {
        let response = test_app().oneshot(get("/categories")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Jewelry"));
        assert!(!body.contains("Print a catalog"));
    }

    #[tokio::test]
    async fn test_gallery_lists_catalog_categories() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;
        let body = body_text(app.oneshot(get("/categories")).await.unwrap()).await;
        assert!(body.contains("Accessories (1)"));
        assert!(body.contains("Print a catalog"));
        assert!(!body.contains("Jewelry"));
    }

    #[tokio::test]
    async fn test_category_query_filters_catalog() {
        let app = seeded_app(vec![
            product(1, "Silk Scarf", "Accessories", None),
            product(2, "Linen Dress", "Clothing", Some("Dresses")),
        ])
        .await;

        let response = app.oneshot(get("/?category=%20clothing%20")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Linen Dress"));
        assert!(!body.contains("Silk Scarf"));
    }

    #[tokio::test]
    async fn test_added_product_shows_in_bag_with_subtotal() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;

        let response = app
            .clone()
            .oneshot(form_post("/bag/add", "product_id=1&quantity=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/bag?notice=added_to_bag");
        let cookie = session_cookie(&response);

        let response = app.oneshot(with_cookie(get("/bag"), &cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Silk Scarf"));
        assert!(body.contains("Subtotal (2 items)"));
        assert!(body.contains("$20.02"));
    }

    #[tokio::test]
    async fn test_empty_quantity_adds_one() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;

        let response = app
            .clone()
            .oneshot(form_post("/bag/add", "product_id=1&quantity="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response);

        let response = app.oneshot(with_cookie(get("/bag"), &cookie)).await.unwrap();
        let body = body_text(response).await;
        assert!(body.contains("Subtotal (1 items)"));
        assert!(body.contains("$10.01"));
    }

    #[tokio::test]
    async fn test_sold_product_cannot_be_added() {
        let app = seeded_app(vec![sold(product(1, "Silk Scarf", "Accessories", None))]).await;

        let response = app
            .clone()
            .oneshot(form_post("/bag/add", "product_id=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("sold out"));

        let response = app
            .oneshot(form_post("/wishlist/move-to-bag", "product_id=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("sold out"));
    }

    #[tokio::test]
    async fn test_wishlist_item_moves_to_bag() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;

        let response = app
            .clone()
            .oneshot(form_post("/wishlist/toggle", "product_id=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/wishlist?notice=saved");
        let cookie = session_cookie(&response);

        let response = app
            .clone()
            .oneshot(with_cookie(get("/wishlist"), &cookie))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("Silk Scarf"));

        let response = app
            .clone()
            .oneshot(with_cookie(
                form_post("/wishlist/move-to-bag", "product_id=1"),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/bag?notice=moved_to_bag");

        let response = app
            .clone()
            .oneshot(with_cookie(get("/bag"), &cookie))
            .await
            .unwrap();
        let body = body_text(response).await;
        assert!(body.contains("Silk Scarf"));
        assert!(body.contains("Subtotal (1 items)"));

        let response = app
            .oneshot(with_cookie(get("/wishlist"), &cookie))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("Nothing saved yet."));
    }

    #[tokio::test]
    async fn test_return_to_with_tab_falls_back_to_wishlist() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;

        let response = app
            .oneshot(form_post(
                "/wishlist/toggle",
                "product_id=1&return_to=%2F%09%2Fevil.test",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/wishlist?notice=saved");
    }

    #[tokio::test]
    async fn test_return_to_non_ascii_falls_back_to_bag() {
        let app = seeded_app(vec![product(1, "Silk Scarf", "Accessories", None)]).await;

        let response = app
            .oneshot(form_post("/bag/add", "product_id=1&return_to=%2Fcaf%C3%A9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/bag?notice=added_to_bag");
    }
}
