use axum::{extract::State, Json};
use dropshop_core::domain::order::{Order, OrderStatus};
use dropshop_db::repositories::{OrderQuery, ProductQuery};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::api::{repository_failure, ApiResult};
use crate::state::AppState;

const RECENT_ORDERS: u32 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    pub total_customers: i64,
    pub revenue: Decimal,
    pub unread_notifications: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardResponse> {
    let all_products = ProductQuery::default();
    let active_products = ProductQuery { active_only: true, ..ProductQuery::default() };

    let stats = DashboardStats {
        total_products: state.products.count(&all_products).await.map_err(repository_failure)?,
        active_products: state.products.count(&active_products).await.map_err(repository_failure)?,
        total_orders: state.orders.count(None).await.map_err(repository_failure)?,
        pending_orders: state
            .orders
            .count(Some(OrderStatus::Pending))
            .await
            .map_err(repository_failure)?,
        processing_orders: state
            .orders
            .count(Some(OrderStatus::Processing))
            .await
            .map_err(repository_failure)?,
        total_customers: state.customers.count().await.map_err(repository_failure)?,
        revenue: state.orders.paid_revenue().await.map_err(repository_failure)?,
        unread_notifications: state
            .notifications
            .unread_count()
            .await
            .map_err(repository_failure)?,
    };

    let recent_orders = state
        .orders
        .list(&OrderQuery { status: None, limit: RECENT_ORDERS, offset: 0 })
        .await
        .map_err(repository_failure)?;

    Ok(Json(DashboardResponse { success: true, stats, recent_orders }))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, Json};
    use chrono::Utc;
    use dropshop_core::domain::order::OrderStatus;
    use rust_decimal::Decimal;

    use super::dashboard;
    use crate::admin::orders::tests::seed_order;
    use crate::state::test_support::{seed_product, test_state};

    #[tokio::test]
    async fn dashboard_counts_catalog_orders_and_paid_revenue() {
        let state = test_state().await;
        seed_product(&state, "Desk Lamp", 2500).await;
        let mut hidden = seed_product(&state, "Old Lamp", 900).await;
        hidden.deactivate(Utc::now());
        state.products.save(hidden).await.expect("save");

        seed_order(&state, "EEEEE1", OrderStatus::Pending).await;
        let mut paid = seed_order(&state, "EEEEE2", OrderStatus::Pending).await;
        paid.mark_paid();
        state.orders.update(&paid).await.expect("update");

        let Json(body) = dashboard(State(state)).await.expect("dashboard");

        assert_eq!(body.stats.total_products, 2);
        assert_eq!(body.stats.active_products, 1);
        assert_eq!(body.stats.total_orders, 2);
        assert_eq!(body.stats.pending_orders, 1);
        assert_eq!(body.stats.processing_orders, 1);
        assert_eq!(body.stats.revenue, Decimal::new(2500, 2));
        assert_eq!(body.recent_orders.len(), 2);
    }
}
