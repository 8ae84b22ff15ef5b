//! Admin API. Every route except `POST /api/admin/login` sits behind
//! [`require_admin`].

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::{login, require_admin};
use crate::state::AppState;

pub mod customers;
pub mod dashboard;
pub mod import;
pub mod notifications;
pub mod orders;
pub mod products;

pub fn router(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/api/admin/products", get(products::list).post(products::create))
        .route(
            "/api/admin/products/{id}",
            get(products::get).put(products::update).delete(products::deactivate),
        )
        .route("/api/admin/orders", get(orders::list))
        .route("/api/admin/orders/{id}", get(orders::get))
        .route("/api/admin/orders/{id}/status", put(orders::update_status))
        .route("/api/admin/customers", get(customers::list).post(customers::create))
        .route("/api/admin/customers/{id}", get(customers::get))
        .route("/api/admin/notifications", get(notifications::list))
        .route("/api/admin/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/admin/notifications/{id}/read", post(notifications::mark_read))
        .route("/api/admin/import", post(import::run_import))
        .route("/api/admin/import/analyses", get(import::list_analyses))
        .route("/api/admin/dashboard", get(dashboard::dashboard))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new().route("/api/admin/login", post(login)).merge(guarded)
}
