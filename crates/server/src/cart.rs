//! Session carts. Lines store product and quantity; name and price are read
//! from the catalog every time the cart is loaded.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use dropshop_core::domain::cart::{Cart, CartError, CartLine};
use dropshop_core::domain::product::{ProductId, StoredProduct};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{bad_request, not_found, repository_failure, ApiFailure, ApiResult};
use crate::state::AppState;

const MAX_SESSION_ID_LEN: usize = 128;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart/{session}", get(get_cart).post(add_item).delete(clear_cart))
        .route("/api/cart/{session}/items/{product_id}", put(set_item_quantity).delete(remove_item))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    pub session_id: String,
    pub items: Vec<CartLine>,
    pub item_count: u64,
    pub subtotal: Decimal,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            success: true,
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
            items: cart.lines().to_vec(),
            session_id: cart.session_id,
        }
    }
}

fn validate_session(session: &str) -> Result<(), ApiFailure> {
    let valid = !session.is_empty()
        && session.len() <= MAX_SESSION_ID_LEN
        && session.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');
    if valid {
        Ok(())
    } else {
        Err(bad_request("session id must be 1-128 letters, digits, dashes or underscores"))
    }
}

fn cart_failure(error: CartError) -> ApiFailure {
    match error {
        CartError::LineNotFound(product_id) => not_found("cart item", product_id),
        CartError::ZeroQuantity => bad_request(error.to_string()),
    }
}

async fn active_product(state: &AppState, product_id: &str) -> Result<StoredProduct, ApiFailure> {
    state
        .products
        .find_by_id(&ProductId(product_id.to_string()))
        .await
        .map_err(repository_failure)?
        .filter(|product| product.active)
        .ok_or_else(|| not_found("product", product_id))
}

/// Same rule checkout applies: a line may not exceed the units on hand.
fn ensure_in_stock(product: &StoredProduct, quantity: u64) -> Result<(), ApiFailure> {
    if i128::from(quantity) > i128::from(product.stock_quantity) {
        return Err(bad_request(format!(
            "only {} of `{}` in stock",
            product.stock_quantity.max(0),
            product.name
        )));
    }
    Ok(())
}

async fn load(state: &AppState, session: &str) -> Result<Cart, ApiFailure> {
    validate_session(session)?;
    state.carts.load(session).await.map_err(repository_failure)
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<CartResponse> {
    let cart = load(&state, &session).await?;
    Ok(Json(cart.into()))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<CartResponse> {
    let mut cart = load(&state, &session).await?;
    let product = active_product(&state, &request.product_id).await?;
    let in_cart = u64::from(cart.quantity_of(&product.id));
    ensure_in_stock(&product, in_cart + u64::from(request.quantity))?;

    cart.add(CartLine {
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit_price: product.price,
        quantity: request.quantity,
    })
    .map_err(cart_failure)?;
    state.carts.save(&cart).await.map_err(repository_failure)?;

    info!(
        event_name = "cart.item.added",
        session_id = %session,
        product_id = %product.id,
        quantity = request.quantity,
        "cart item added"
    );
    Ok(Json(cart.into()))
}

pub async fn set_item_quantity(
    State(state): State<AppState>,
    Path((session, product_id)): Path<(String, String)>,
    Json(request): Json<SetQuantityRequest>,
) -> ApiResult<CartResponse> {
    let mut cart = load(&state, &session).await?;
    cart.set_quantity(&ProductId(product_id.clone()), request.quantity).map_err(cart_failure)?;
    if request.quantity > 0 {
        let product = active_product(&state, &product_id).await?;
        ensure_in_stock(&product, u64::from(request.quantity))?;
    }
    state.carts.save(&cart).await.map_err(repository_failure)?;
    Ok(Json(cart.into()))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((session, product_id)): Path<(String, String)>,
) -> ApiResult<CartResponse> {
    let mut cart = load(&state, &session).await?;
    cart.remove(&ProductId(product_id)).map_err(cart_failure)?;
    state.carts.save(&cart).await.map_err(repository_failure)?;
    Ok(Json(cart.into()))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<CartResponse> {
    validate_session(&session)?;
    state.carts.clear(&session).await.map_err(repository_failure)?;
    Ok(Json(Cart::new(session).into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{
        add_item, clear_cart, get_cart, remove_item, set_item_quantity, AddItemRequest,
        SetQuantityRequest,
    };
    use crate::state::test_support::{seed_product, test_state};

    fn add(product_id: &str, quantity: u32) -> Json<AddItemRequest> {
        Json(AddItemRequest { product_id: product_id.to_string(), quantity })
    }

    #[tokio::test]
    async fn adding_twice_merges_and_totals_use_catalog_price() {
        let state = test_state().await;
        let lamp = seed_product(&state, "Desk Lamp", 2500).await;

        add_item(State(state.clone()), Path("sess-1".to_string()), add(&lamp.id.0, 1))
            .await
            .expect("first add");
        let Json(cart) =
            add_item(State(state.clone()), Path("sess-1".to_string()), add(&lamp.id.0, 2))
                .await
                .expect("second add");

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.subtotal, Decimal::new(7500, 2));

        let Json(reloaded) =
            get_cart(State(state), Path("sess-1".to_string())).await.expect("reload");
        assert_eq!(reloaded.item_count, 3);
    }

    #[tokio::test]
    async fn adding_inactive_or_missing_products_fails() {
        let state = test_state().await;
        let mut lamp = seed_product(&state, "Desk Lamp", 2500).await;
        lamp.deactivate(Utc::now());
        state.products.save(lamp.clone()).await.expect("save");

        let (status, _) = add_item(State(state.clone()), Path("sess-1".to_string()), add(&lamp.id.0, 1))
            .await
            .expect_err("inactive");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = add_item(State(state), Path("sess-1".to_string()), add("nope", 1))
            .await
            .expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn zero_quantity_add_is_a_bad_request() {
        let state = test_state().await;
        let lamp = seed_product(&state, "Desk Lamp", 2500).await;

        let (status, _) = add_item(State(state), Path("sess-1".to_string()), add(&lamp.id.0, 0))
            .await
            .expect_err("zero");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quantities_beyond_stock_are_rejected_and_cart_stays_readable() {
        let state = test_state().await;
        let lamp = seed_product(&state, "Desk Lamp", 2500).await;
        let mat = seed_product(&state, "Yoga Mat", 1000).await;
        let session = || Path("sess-3".to_string());

        let (status, Json(body)) = add_item(State(state.clone()), session(), add(&lamp.id.0, u32::MAX))
            .await
            .expect_err("far beyond stock");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("only 25"));

        add_item(State(state.clone()), session(), add(&lamp.id.0, 20)).await.expect("within stock");
        let (status, _) = add_item(State(state.clone()), session(), add(&lamp.id.0, 6))
            .await
            .expect_err("existing line plus new units exceed stock");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        add_item(State(state.clone()), session(), add(&mat.id.0, 1)).await.expect("add mat");
        let (status, _) = set_item_quantity(
            State(state.clone()),
            Path(("sess-3".to_string(), mat.id.0.clone())),
            Json(SetQuantityRequest { quantity: u32::MAX }),
        )
        .await
        .expect_err("set beyond stock");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Json(cart) = get_cart(State(state), session()).await.expect("cart still loads");
        assert_eq!(cart.item_count, 21);
        assert_eq!(cart.subtotal, Decimal::new(51000, 2));
    }

    #[tokio::test]
    async fn set_quantity_remove_and_clear() {
        let state = test_state().await;
        let lamp = seed_product(&state, "Desk Lamp", 2500).await;
        let mat = seed_product(&state, "Yoga Mat", 1000).await;
        let session = || Path("sess-2".to_string());

        add_item(State(state.clone()), session(), add(&lamp.id.0, 1)).await.expect("add lamp");
        add_item(State(state.clone()), session(), add(&mat.id.0, 1)).await.expect("add mat");

        let Json(cart) = set_item_quantity(
            State(state.clone()),
            Path(("sess-2".to_string(), mat.id.0.clone())),
            Json(SetQuantityRequest { quantity: 4 }),
        )
        .await
        .expect("set quantity");
        assert_eq!(cart.subtotal, Decimal::new(6500, 2));

        let Json(cart) =
            remove_item(State(state.clone()), Path(("sess-2".to_string(), lamp.id.0.clone())))
                .await
                .expect("remove");
        assert_eq!(cart.items.len(), 1);

        let (status, _) = remove_item(State(state.clone()), Path(("sess-2".to_string(), lamp.id.0)))
            .await
            .expect_err("already removed");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let Json(cart) = clear_cart(State(state.clone()), session()).await.expect("clear");
        assert_eq!(cart.item_count, 0);
        let Json(cart) = get_cart(State(state), session()).await.expect("reload");
        assert!(cart.items.is_empty());
    }

    #[tokio::test]
    async fn malformed_session_ids_are_rejected() {
        let state = test_state().await;
        let (status, _) =
            get_cart(State(state), Path("bad session!".to_string())).await.expect_err("invalid");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
