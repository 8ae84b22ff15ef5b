//! Customer order lookup: `GET /api/orders/track?order_number=..&email=..`.
//!
//! Both values must match the same order. A wrong email answers exactly like
//! an unknown order number.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use dropshop_core::domain::customer::normalize_email;
use dropshop_core::domain::order::{Order, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{bad_request, not_found, repository_failure, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/orders/track", get(track_order))
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackingParams {
    pub order_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackedItem {
    pub product_name: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub items: Vec<TrackedItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for TrackingResponse {
    fn from(order: Order) -> Self {
        Self {
            success: true,
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            tracking_number: order.tracking_number,
            tracking_url: order.tracking_url,
            items: order
                .items
                .into_iter()
                .map(|item| TrackedItem { product_name: item.product_name, quantity: item.quantity })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

pub async fn track_order(
    State(state): State<AppState>,
    Query(params): Query<TrackingParams>,
) -> ApiResult<TrackingResponse> {
    let order_number = params.order_number.as_deref().map(str::trim).unwrap_or_default().to_ascii_uppercase();
    let email = params.email.as_deref().map(normalize_email).unwrap_or_default();
    if order_number.is_empty() || email.is_empty() {
        return Err(bad_request("order_number and email are required"));
    }

    let order = state
        .orders
        .find_by_order_number(&order_number)
        .await
        .map_err(repository_failure)?
        .filter(|order| order.customer_email.as_deref().map(normalize_email).as_deref() == Some(email.as_str()))
        .ok_or_else(|| not_found("order", order_number.clone()))?;

    info!(event_name = "order.tracking.viewed", order_id = %order.id.0, "order tracking viewed");
    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        Json,
    };
    use dropshop_core::domain::order::OrderStatus;

    use super::{track_order, TrackingParams};
    use crate::admin::orders::tests::seed_order;
    use crate::state::test_support::test_state;

    fn params(order_number: &str, email: &str) -> Query<TrackingParams> {
        Query(TrackingParams { order_number: Some(order_number.to_string()), email: Some(email.to_string()) })
    }

    #[tokio::test]
    async fn matching_number_and_email_returns_status_and_tracking() {
        let state = test_state().await;
        let mut order = seed_order(&state, "TRACK1", OrderStatus::Shipped).await;
        order.tracking_number = Some("1Z42".to_string());
        order.tracking_url = Some("https://track.example.com/1Z42".to_string());
        state.orders.update(&order).await.expect("update");

        let Json(body) = track_order(State(state), params(" ed-1-track1 ", "Buyer@Example.com"))
            .await
            .expect("tracked");

        assert!(body.success);
        assert_eq!(body.order_number, "ED-1-TRACK1");
        assert_eq!(body.status, OrderStatus::Shipped);
        assert_eq!(body.tracking_number.as_deref(), Some("1Z42"));
        assert_eq!(body.tracking_url.as_deref(), Some("https://track.example.com/1Z42"));
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.items[0].product_name, "Desk Lamp");
    }

    #[tokio::test]
    async fn wrong_email_looks_like_an_unknown_order() {
        let state = test_state().await;
        seed_order(&state, "TRACK2", OrderStatus::Processing).await;

        let (status, _) = track_order(State(state.clone()), params("ED-1-TRACK2", "someone@example.com"))
            .await
            .expect_err("wrong email");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = track_order(State(state.clone()), params("ED-1-NOPE00", "buyer@example.com"))
            .await
            .expect_err("unknown number");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = track_order(State(state), Query(TrackingParams::default()))
            .await
            .expect_err("missing params");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
