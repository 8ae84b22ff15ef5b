use axum::{
    extract::{Path, Query, State},
    Json,
};
use dropshop_core::domain::notification::Notification;
use dropshop_core::domain::order::{Order, OrderId, OrderStatus};
use dropshop_core::errors::{ApplicationError, DomainError};
use dropshop_db::repositories::{OrderQuery, RepositoryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::api::{
    application_failure, bad_request, not_found, repository_failure, ApiFailure, ApiResult,
    PageParams, Pagination,
};
use crate::state::AppState;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub success: bool,
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    /// Order id on the supplier's side, recorded when the order is placed there.
    #[serde(default)]
    pub supplier_order_id: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// Supplier-side fields written together with a status change.
#[derive(Clone, Debug, Default)]
pub(crate) struct FulfillmentUpdate {
    pub supplier_order_id: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

impl FulfillmentUpdate {
    fn apply(self, order: &mut Order) {
        let non_blank = |value: Option<String>| {
            value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        };
        if let Some(supplier_order_id) = non_blank(self.supplier_order_id) {
            order.supplier_order_id = Some(supplier_order_id);
        }
        if let Some(tracking_number) = non_blank(self.tracking_number) {
            order.tracking_number = Some(tracking_number);
        }
        if let Some(tracking_url) = non_blank(self.tracking_url) {
            order.tracking_url = Some(tracking_url);
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum StatusChangeError {
    #[error(transparent)]
    Transition(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl StatusChangeError {
    fn into_failure(self) -> ApiFailure {
        match self {
            Self::Transition(error) => application_failure(ApplicationError::Domain(error)),
            Self::Repository(error) => repository_failure(error),
        }
    }
}

/// Moves the order to `next`, persists it and records a status-change
/// notification when the status actually changed. Fulfillment fields are only
/// overwritten when given.
pub(crate) async fn change_status(
    state: &AppState,
    order: &mut Order,
    next: OrderStatus,
    fulfillment: FulfillmentUpdate,
) -> Result<bool, StatusChangeError> {
    let previous = order.status;
    order.transition_to(next)?;
    fulfillment.apply(order);
    state.orders.update(order).await?;

    let changed = previous != order.status;
    if changed {
        info!(
            event_name = "order.status.changed",
            order_id = %order.id.0,
            from = previous.as_str(),
            to = order.status.as_str(),
            "order status changed"
        );
        state
            .notify(Notification::order_status_changed(
                &order.id.0,
                &order.order_number,
                order.status.as_str(),
            ))
            .await;
    }
    Ok(changed)
}

fn parse_status(raw: &str) -> Result<OrderStatus, ApiFailure> {
    OrderStatus::parse(raw).ok_or_else(|| bad_request(format!("unknown order status `{raw}`")))
}

async fn load(state: &AppState, id: &str) -> Result<Order, ApiFailure> {
    state
        .orders
        .find_by_id(&OrderId(id.to_string()))
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("order", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> ApiResult<OrderList> {
    let status = params
        .status
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_status)
        .transpose()?;
    let window = PageParams { page: params.page, per_page: params.per_page }.window();

    let query = OrderQuery { status, limit: window.per_page, offset: window.offset() };
    let orders = state.orders.list(&query).await.map_err(repository_failure)?;
    let total = state.orders.count(status).await.map_err(repository_failure)?;
    Ok(Json(OrderList { success: true, orders, pagination: window.pagination(total) }))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<OrderResponse> {
    let order = load(&state, &id).await?;
    Ok(Json(OrderResponse { success: true, order }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<OrderResponse> {
    let next = parse_status(&update.status)?;
    let mut order = load(&state, &id).await?;
    let fulfillment = FulfillmentUpdate {
        supplier_order_id: update.supplier_order_id,
        tracking_number: update.tracking_number,
        tracking_url: update.tracking_url,
    };
    change_status(&state, &mut order, next, fulfillment)
        .await
        .map_err(StatusChangeError::into_failure)?;
    Ok(Json(OrderResponse { success: true, order }))
}
