//! Checkout and payment confirmation.
//!
//! - `POST /api/checkout`          prices the cart from the catalog, opens a
//!                                 payment intent and records a pending order
//! - `POST /api/checkout/confirm`  syncs an order with its payment intent

use std::collections::HashMap;

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use dropshop_core::domain::customer::{is_plausible_email, normalize_email, Customer};
use dropshop_core::domain::notification::Notification;
use dropshop_core::domain::order::{
    generate_order_number, Order, OrderId, OrderItem, OrderStatus, PaymentStatus,
};
use dropshop_core::domain::product::ProductId;
use dropshop_core::errors::ApplicationError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{application_failure, bad_request, not_found, repository_failure, ApiFailure, ApiResult};
use crate::payments::{PaymentError, PaymentMetadata};
use crate::state::AppState;

/// Largest accepted gap between the client's amount and the computed subtotal.
const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(create_checkout))
        .route("/api/checkout/confirm", post(confirm_payment))
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cart_items: Vec<CheckoutItem>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub billing_address: Option<serde_json::Value>,
    /// Cart to clear once the order is recorded.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutData {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub order_id: String,
    pub order_number: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub data: CheckoutData,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmData {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub data: ConfirmData,
}

fn payment_failure(error: PaymentError) -> ApiFailure {
    match error {
        PaymentError::NotConfigured => {
            application_failure(ApplicationError::Configuration(error.to_string()))
        }
        other => application_failure(ApplicationError::Integration(other.to_string())),
    }
}

fn validate(request: &CheckoutRequest) -> Result<(), ApiFailure> {
    if request.amount <= Decimal::ZERO {
        return Err(bad_request("amount must be greater than zero"));
    }
    if request.cart_items.is_empty() {
        return Err(bad_request("cart_items must not be empty"));
    }
    if request.cart_items.iter().any(|item| item.quantity == 0) {
        return Err(bad_request("every cart item needs a quantity of at least 1"));
    }
    if let Some(email) = &request.customer_email {
        if !is_plausible_email(email) {
            return Err(bad_request("customer_email is not a valid email address"));
        }
    }
    Ok(())
}

/// Collapses repeated products and prices every line from the catalog.
async fn price_items(state: &AppState, items: &[CheckoutItem]) -> Result<Vec<OrderItem>, ApiFailure> {
    let mut quantities: Vec<(String, u32)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for item in items {
        match index.get(item.product_id.as_str()) {
            Some(position) => {
                quantities[*position].1 = quantities[*position].1.saturating_add(item.quantity)
            }
            None => {
                index.insert(item.product_id.as_str(), quantities.len());
                quantities.push((item.product_id.clone(), item.quantity));
            }
        }
    }

    let mut priced = Vec::with_capacity(quantities.len());
    for (product_id, quantity) in quantities {
        let product = state
            .products
            .find_by_id(&ProductId(product_id.clone()))
            .await
            .map_err(repository_failure)?
            .filter(|product| product.active)
            .ok_or_else(|| bad_request(format!("product `{product_id}` is not available")))?;
        if i64::from(quantity) > product.stock_quantity {
            return Err(bad_request(format!(
                "only {} of `{}` in stock",
                product.stock_quantity.max(0),
                product.name
            )));
        }
        priced.push(OrderItem {
            product_id: product.id,
            product_name: product.name,
            quantity,
            unit_price: product.price,
        });
    }
    Ok(priced)
}

fn minor_units(amount: Decimal) -> Result<i64, ApiFailure> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| bad_request("amount is out of range"))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    validate(&request)?;

    let items = price_items(&state, &request.cart_items).await?;
    let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
    if (request.amount - subtotal).abs() > AMOUNT_TOLERANCE {
        return Err(bad_request(format!(
            "amount {} does not match the cart total {subtotal}",
            request.amount
        )));
    }

    let currency = request
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|currency| !currency.is_empty())
        .unwrap_or(&state.config.payments.currency)
        .to_ascii_lowercase();
    let customer_email = request.customer_email.as_deref().map(normalize_email);
    let now = Utc::now();
    let order_number = generate_order_number(now);

    let intent = state
        .payments
        .create_payment_intent(
            minor_units(subtotal)?,
            &currency,
            &PaymentMetadata { customer_email: customer_email.clone(), order_number: order_number.clone() },
        )
        .await
        .map_err(payment_failure)?;

    let order = Order {
        id: OrderId(Uuid::new_v4().to_string()),
        order_number,
        customer_email: customer_email.clone(),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_intent_id: Some(intent.id.clone()),
        subtotal,
        total: subtotal,
        currency: currency.clone(),
        shipping_address: request.shipping_address.clone(),
        billing_address: request.billing_address.clone(),
        supplier_order_id: None,
        tracking_number: None,
        tracking_url: None,
        items,
        created_at: now,
        updated_at: now,
    };
    state.orders.create(&order).await.map_err(repository_failure)?;

    info!(
        event_name = "checkout.order.created",
        order_id = %order.id.0,
        order_number = %order.order_number,
        payment_intent_id = %intent.id,
        total = %order.total,
        "pending order recorded"
    );

    if let Some(email) = &customer_email {
        record_customer(&state, email, request.customer_name.clone()).await;
    }
    state
        .notify(Notification::new_order(
            &order.id.0,
            &order.order_number,
            &format!("{} {}", order.total, currency.to_ascii_uppercase()),
        ))
        .await;

    if let Some(session_id) = request.session_id.as_deref().filter(|id| !id.is_empty()) {
        if let Err(error) = state.carts.clear(session_id).await {
            warn!(event_name = "checkout.cart.clear_failed", session_id, error = %error, "cart was not cleared");
        }
    }

    Ok(Json(CheckoutResponse {
        success: true,
        data: CheckoutData {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            order_id: order.id.0,
            order_number: order.order_number,
            amount: order.total,
            currency,
        },
    }))
}

async fn record_customer(state: &AppState, email: &str, name: Option<String>) {
    match state.customers.upsert_by_email(Customer::new(email, name, None, Utc::now())).await {
        Ok((customer, true)) => {
            state.notify(Notification::new_customer(&customer.id.0, &customer.email)).await;
        }
        Ok((_, false)) => {}
        Err(error) => {
            warn!(event_name = "checkout.customer.upsert_failed", error = %error, "customer was not recorded");
        }
    }
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<ConfirmResponse> {
    let intent_id = request.payment_intent_id.trim();
    if intent_id.is_empty() {
        return Err(bad_request("payment_intent_id is required"));
    }

    let mut order = state
        .orders
        .find_by_payment_intent(intent_id)
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("order", intent_id))?;
    let intent = state.payments.retrieve_payment_intent(intent_id).await.map_err(payment_failure)?;

    let previous = (order.status, order.payment_status);
    if intent.is_succeeded() && order.payment_status != PaymentStatus::Paid {
        order.mark_paid();
    } else if intent.is_canceled() && order.payment_status == PaymentStatus::Pending {
        order.payment_status = PaymentStatus::Failed;
        if order.can_transition_to(OrderStatus::Cancelled) {
            order.status = OrderStatus::Cancelled;
        }
        order.updated_at = Utc::now();
    }

    if (order.status, order.payment_status) != previous {
        state.orders.update(&order).await.map_err(repository_failure)?;
        info!(
            event_name = "checkout.payment.confirmed",
            order_id = %order.id.0,
            intent_status = %intent.status,
            status = order.status.as_str(),
            payment_status = order.payment_status.as_str(),
            "order synced with payment intent"
        );
        if order.status != previous.0 {
            state
                .notify(Notification::order_status_changed(
                    &order.id.0,
                    &order.order_number,
                    order.status.as_str(),
                ))
                .await;
        }
    }

    Ok(Json(ConfirmResponse {
        success: true,
        data: ConfirmData {
            order_id: order.id.0,
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
        },
    }))
}
