//! Supplier fulfillment webhooks: `POST /api/webhooks/zendrop` and
//! `POST /api/webhooks/cj`.
//!
//! Zendrop order events are matched on `supplier_order_id`, product events on
//! the Zendrop `external_id`. CJ order events carry `cj_order_id` and our
//! `order_number`; the first is tried before the second and is recorded on
//! the order. Events that cannot be applied are logged and still acknowledged
//! so the supplier does not retry them.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::notification::{Notification, LOW_STOCK_LEVEL};
use dropshop_core::domain::order::{Order, OrderStatus};
use dropshop_core::signing::verify_webhook_signature;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::admin::orders::{change_status, FulfillmentUpdate, StatusChangeError};
use crate::api::{bad_request, repository_failure, unauthorized, ApiFailure, ApiResult};
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-zendrop-signature";
pub const CJ_SIGNATURE_HEADER: &str = "x-cj-signature";
const CJ_TRACKING_URL: &str = "https://cjdropshipping.com/track/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/webhooks/zendrop", post(zendrop_webhook))
        .route("/api/webhooks/cj", post(cj_webhook))
}

/// Zendrop names the event `event`, CJ names it `type`.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(alias = "type")]
    pub event: String,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub event: String,
    pub handled: bool,
}

enum WebhookAction {
    OrderStatus(OrderStatus),
    Inventory,
    OutOfStock,
    Ignore,
}

fn action_for(event: &str) -> WebhookAction {
    match event {
        "order.created" | "order.processing" => WebhookAction::OrderStatus(OrderStatus::Processing),
        "order.shipped" => WebhookAction::OrderStatus(OrderStatus::Shipped),
        "order.delivered" => WebhookAction::OrderStatus(OrderStatus::Delivered),
        "order.cancelled" => WebhookAction::OrderStatus(OrderStatus::Cancelled),
        "product.inventory.updated" => WebhookAction::Inventory,
        "product.out_of_stock" => WebhookAction::OutOfStock,
        _ => WebhookAction::Ignore,
    }
}

/// CJ reports its own status on `order.updated`; anything unrecognised means
/// the order is still being worked on.
fn cj_status_for(event: &str, data: &Value) -> Option<OrderStatus> {
    match event {
        "order.created" => Some(OrderStatus::Processing),
        "order.updated" => Some(match text_field(data, "status").as_deref() {
            Some("shipped") => OrderStatus::Shipped,
            Some("delivered") => OrderStatus::Delivered,
            Some("cancelled" | "canceled") => OrderStatus::Cancelled,
            _ => OrderStatus::Processing,
        }),
        "order.shipped" => Some(OrderStatus::Shipped),
        "order.delivered" => Some(OrderStatus::Delivered),
        "order.cancelled" => Some(OrderStatus::Cancelled),
        _ => None,
    }
}

/// Ids arrive as numbers or strings.
fn id_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn text_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string).filter(|value| !value.is_empty())
}

/// Checks the HMAC only when a secret is configured for the supplier.
fn verify(
    supplier: SupplierKind,
    secret: Option<&SecretString>,
    signature_header: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), ApiFailure> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let signature = headers.get(signature_header).and_then(|value| value.to_str().ok());
    match signature {
        Some(signature) if verify_webhook_signature(secret.expose_secret(), body, signature) => Ok(()),
        _ => {
            warn!(
                event_name = "webhook.bad_signature",
                supplier = supplier.as_str(),
                "webhook signature rejected"
            );
            Err(unauthorized("invalid webhook signature"))
        }
    }
}

fn parse_envelope(body: &[u8]) -> Result<WebhookEnvelope, ApiFailure> {
    serde_json::from_slice(body).map_err(|error| bad_request(format!("malformed webhook payload: {error}")))
}

pub async fn zendrop_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let secret = state.config.suppliers.zendrop.webhook_secret.as_ref();
    verify(SupplierKind::Zendrop, secret, SIGNATURE_HEADER, &headers, &body)?;
    let envelope = parse_envelope(&body)?;

    info!(event_name = "webhook.zendrop.received", webhook_event = %envelope.event, "zendrop webhook received");

    let handled = match action_for(&envelope.event) {
        WebhookAction::OrderStatus(next) => zendrop_order_event(&state, &envelope, next).await?,
        WebhookAction::Inventory => {
            let stock = envelope.data.get("inventory").and_then(Value::as_f64);
            match stock {
                Some(stock) => apply_stock(&state, &envelope, stock.floor() as i64).await?,
                None => {
                    warn!(event_name = "webhook.zendrop.missing_inventory", "inventory update without a level");
                    false
                }
            }
        }
        WebhookAction::OutOfStock => apply_stock(&state, &envelope, 0).await?,
        WebhookAction::Ignore => {
            info!(event_name = "webhook.zendrop.unhandled", webhook_event = %envelope.event, "unhandled zendrop event");
            false
        }
    };

    Ok(Json(WebhookAck { success: true, event: envelope.event, handled }))
}

pub async fn cj_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookAck> {
    let secret = state.config.suppliers.cj.webhook_secret.as_ref();
    verify(SupplierKind::Cj, secret, CJ_SIGNATURE_HEADER, &headers, &body)?;
    let envelope = parse_envelope(&body)?;

    info!(event_name = "webhook.cj.received", webhook_event = %envelope.event, "cj webhook received");

    let handled = match cj_status_for(&envelope.event, &envelope.data) {
        Some(next) => cj_order_event(&state, &envelope, next).await?,
        None => {
            info!(event_name = "webhook.cj.unhandled", webhook_event = %envelope.event, "unhandled cj event");
            false
        }
    };

    Ok(Json(WebhookAck { success: true, event: envelope.event, handled }))
}

async fn zendrop_order_event(
    state: &AppState,
    envelope: &WebhookEnvelope,
    next: OrderStatus,
) -> Result<bool, ApiFailure> {
    let Some(supplier_order_id) = id_field(&envelope.data, "order_id") else {
        warn!(event_name = "webhook.zendrop.missing_order_id", webhook_event = %envelope.event, "order event without order_id");
        return Ok(false);
    };
    let Some(order) = state
        .orders
        .find_by_supplier_order_id(&supplier_order_id)
        .await
        .map_err(repository_failure)?
    else {
        warn!(event_name = "webhook.zendrop.unknown_order", supplier_order_id = %supplier_order_id, "no order for supplier order id");
        return Ok(false);
    };

    let fulfillment = if next == OrderStatus::Shipped {
        FulfillmentUpdate {
            tracking_number: text_field(&envelope.data, "tracking_number"),
            tracking_url: text_field(&envelope.data, "tracking_url"),
            ..FulfillmentUpdate::default()
        }
    } else {
        FulfillmentUpdate::default()
    };
    apply_order_status(state, SupplierKind::Zendrop, order, next, fulfillment).await
}

async fn cj_order_event(
    state: &AppState,
    envelope: &WebhookEnvelope,
    next: OrderStatus,
) -> Result<bool, ApiFailure> {
    let cj_order_id = id_field(&envelope.data, "cj_order_id");
    let order_number = id_field(&envelope.data, "order_number");

    let mut found = None;
    if let Some(cj_order_id) = &cj_order_id {
        found = state.orders.find_by_supplier_order_id(cj_order_id).await.map_err(repository_failure)?;
    }
    if found.is_none() {
        if let Some(order_number) = &order_number {
            found = state.orders.find_by_order_number(order_number).await.map_err(repository_failure)?;
        }
    }
    let Some(order) = found else {
        warn!(
            event_name = "webhook.cj.unknown_order",
            cj_order_id = cj_order_id.as_deref().unwrap_or_default(),
            order_number = order_number.as_deref().unwrap_or_default(),
            "no order for cj event"
        );
        return Ok(false);
    };

    let tracking_number = text_field(&envelope.data, "tracking_number");
    let tracking_url = text_field(&envelope.data, "tracking_url")
        .or_else(|| tracking_number.as_ref().map(|number| format!("{CJ_TRACKING_URL}{number}")));
    let fulfillment = FulfillmentUpdate { supplier_order_id: cj_order_id, tracking_number, tracking_url };
    apply_order_status(state, SupplierKind::Cj, order, next, fulfillment).await
}

async fn apply_order_status(
    state: &AppState,
    supplier: SupplierKind,
    mut order: Order,
    next: OrderStatus,
    fulfillment: FulfillmentUpdate,
) -> Result<bool, ApiFailure> {
    match change_status(state, &mut order, next, fulfillment).await {
        Ok(_) => Ok(true),
        Err(StatusChangeError::Transition(error)) => {
            warn!(
                event_name = "webhook.order.invalid_transition",
                supplier = supplier.as_str(),
                order_id = %order.id.0,
                error = %error,
                "order left unchanged"
            );
            Ok(false)
        }
        Err(StatusChangeError::Repository(error)) => Err(repository_failure(error)),
    }
}

async fn apply_stock(
    state: &AppState,
    envelope: &WebhookEnvelope,
    stock: i64,
) -> Result<bool, ApiFailure> {
    let Some(external_id) = id_field(&envelope.data, "product_id") else {
        warn!(event_name = "webhook.zendrop.missing_product_id", webhook_event = %envelope.event, "product event without product_id");
        return Ok(false);
    };
    let updated = state
        .products
        .set_stock_by_external_id(SupplierKind::Zendrop, &external_id, stock)
        .await
        .map_err(repository_failure)?;

    let Some(product) = updated else {
        warn!(event_name = "webhook.zendrop.unknown_product", external_id = %external_id, "no product for zendrop id");
        return Ok(false);
    };

    info!(
        event_name = "webhook.zendrop.stock_updated",
        product_id = %product.id,
        stock_quantity = product.stock_quantity,
        "product stock updated"
    );
    if product.active && product.stock_quantity <= LOW_STOCK_LEVEL {
        state
            .notify(Notification::low_stock(&product.id.0, &product.name, product.stock_quantity))
            .await;
    }
    Ok(true)
}
