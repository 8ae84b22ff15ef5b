use axum::{http::Uri, Router};
use tower_http::trace::TraceLayer;

use crate::api::{failure, ApiFailure};
use crate::state::AppState;
use crate::{admin, cart, checkout, health, storefront, tracking, webhooks};

/// The full HTTP surface: storefront pages, public JSON API, admin API and
/// supplier webhooks.
pub fn build(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(storefront::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(tracking::router())
        .merge(admin::router(state.clone()))
        .merge(webhooks::router())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback(uri: Uri) -> ApiFailure {
    failure(axum::http::StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::build;
    use crate::state::test_support::{seed_product, test_state};

    async fn status_of(uri: &str) -> StatusCode {
        let state = test_state().await;
        seed_product(&state, "Desk Lamp", 2500).await;
        build(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
            .status()
    }

    #[tokio::test]
    async fn public_routes_are_reachable() {
        assert_eq!(status_of("/health").await, StatusCode::OK);
        assert_eq!(status_of("/").await, StatusCode::OK);
        assert_eq!(status_of("/api/products?category=Home").await, StatusCode::OK);
        assert_eq!(status_of("/api/categories").await, StatusCode::OK);
        assert_eq!(status_of("/api/orders/track?email=a%40example.com").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        assert_eq!(status_of("/api/admin/dashboard").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/admin/orders").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_paths_are_json_not_found() {
        assert_eq!(status_of("/api/nope").await, StatusCode::NOT_FOUND);
    }
}
