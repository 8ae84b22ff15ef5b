use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use dropshop_core::domain::notification::{Notification, LOW_STOCK_LEVEL};
use dropshop_core::domain::product::{ProductDraft, ProductId, StoredProduct};
use dropshop_db::repositories::ProductQuery;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{bad_request, not_found, repository_failure, ApiFailure, ApiResult, PageParams, Pagination};
use crate::state::AppState;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdminProductParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    /// Only active products when true.
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AdminProductList {
    pub success: bool,
    pub products: Vec<StoredProduct>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct AdminProductResponse {
    pub success: bool,
    pub product: StoredProduct,
}

async fn load(state: &AppState, id: &str) -> Result<StoredProduct, ApiFailure> {
    state
        .products
        .find_by_id(&ProductId(id.to_string()))
        .await
        .map_err(repository_failure)?
        .ok_or_else(|| not_found("product", id))
}

async fn alert_if_low(state: &AppState, product: &StoredProduct) {
    if product.active && product.stock_quantity <= LOW_STOCK_LEVEL {
        state
            .notify(Notification::low_stock(&product.id.0, &product.name, product.stock_quantity))
            .await;
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<AdminProductParams>,
) -> ApiResult<AdminProductList> {
    let window = PageParams { page: params.page, per_page: params.per_page }.window();
    let query = ProductQuery {
        active_only: params.active.unwrap_or(false),
        category: params.category.filter(|value| !value.trim().is_empty()),
        search: params.search.filter(|value| !value.trim().is_empty()),
        limit: window.per_page,
        offset: window.offset(),
    };
    let products = state.products.list(&query).await.map_err(repository_failure)?;
    let total = state.products.count(&query).await.map_err(repository_failure)?;
    Ok(Json(AdminProductList { success: true, products, pagination: window.pagination(total) }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AdminProductResponse> {
    let product = load(&state, &id).await?;
    Ok(Json(AdminProductResponse { success: true, product }))
}

pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<AdminProductResponse>), ApiFailure> {
    draft.validate().map_err(bad_request)?;
    let product = draft.into_product(ProductId::generate(), Utc::now());
    state.products.save(product.clone()).await.map_err(repository_failure)?;

    info!(event_name = "admin.product.created", product_id = %product.id, "product created");
    alert_if_low(&state, &product).await;
    Ok((StatusCode::CREATED, Json(AdminProductResponse { success: true, product })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<AdminProductResponse> {
    draft.validate().map_err(bad_request)?;
    let mut product = load(&state, &id).await?;
    let previous_stock = product.stock_quantity;
    product.apply_draft(draft, Utc::now());
    state.products.save(product.clone()).await.map_err(repository_failure)?;

    info!(event_name = "admin.product.updated", product_id = %product.id, "product updated");
    if product.stock_quantity != previous_stock {
        alert_if_low(&state, &product).await;
    }
    Ok(Json(AdminProductResponse { success: true, product }))
}

/// Hides the product from the storefront. Order history keeps referencing it.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AdminProductResponse> {
    let mut product = load(&state, &id).await?;
    product.deactivate(Utc::now());
    state.products.save(product.clone()).await.map_err(repository_failure)?;

    info!(event_name = "admin.product.deactivated", product_id = %product.id, "product deactivated");
    Ok(Json(AdminProductResponse { success: true, product }))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use dropshop_core::domain::notification::NotificationKind;
    use dropshop_core::domain::product::ProductDraft;
    use rust_decimal::Decimal;

    use super::{create, deactivate, get, list, update, AdminProductParams};
    use crate::state::test_support::{seed_product, test_state};

    fn draft(name: &str, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: String::new(),
            price: Decimal::new(1999, 2),
            compare_at_price: None,
            cost_price: Some(Decimal::new(700, 2)),
            shipping_cost: None,
            category: "Fitness".to_string(),
            tags: vec!["yoga".to_string()],
            images: Vec::new(),
            stock_quantity: stock,
            active: true,
        }
    }

    #[tokio::test]
    async fn create_then_update_product() {
        let state = test_state().await;

        let (status, Json(created)) =
            create(State(state.clone()), Json(draft("Yoga Mat", 40))).await.expect("create");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.product.slug, "yoga-mat");

        let mut changed = draft("Yoga Mat Pro", 40);
        changed.price = Decimal::new(2999, 2);
        let Json(updated) = update(State(state.clone()), Path(created.product.id.0.clone()), Json(changed))
            .await
            .expect("update");
        assert_eq!(updated.product.name, "Yoga Mat Pro");
        assert_eq!(updated.product.price, Decimal::new(2999, 2));
        assert_eq!(updated.product.created_at, created.product.created_at);
        assert_eq!(state.notifications.unread_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected() {
        let state = test_state().await;
        let mut invalid = draft("Yoga Mat", 1);
        invalid.price = Decimal::ZERO;

        let (status, Json(error)) = create(State(state), Json(invalid)).await.expect_err("invalid");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.error.contains("price"));
    }

    #[tokio::test]
    async fn low_stock_raises_a_notification() {
        let state = test_state().await;
        let product = seed_product(&state, "Desk Lamp", 2500).await;

        update(State(state.clone()), Path(product.id.0), Json(draft("Desk Lamp", 3)))
            .await
            .expect("update");

        let notifications = state.notifications.list(true, 10).await.expect("list");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Product);
    }

    #[tokio::test]
    async fn deactivated_products_stay_visible_to_admin() {
        let state = test_state().await;
        let product = seed_product(&state, "Desk Lamp", 2500).await;

        let Json(body) =
            deactivate(State(state.clone()), Path(product.id.0.clone())).await.expect("deactivate");
        assert!(!body.product.active);

        let Json(fetched) = get(State(state.clone()), Path(product.id.0)).await.expect("get");
        assert!(!fetched.product.active);

        let Json(all) = list(State(state.clone()), Query(AdminProductParams::default())).await.expect("list");
        assert_eq!(all.pagination.total, 1);
        let Json(active) = list(
            State(state),
            Query(AdminProductParams { active: Some(true), ..AdminProductParams::default() }),
        )
        .await
        .expect("list active");
        assert_eq!(active.pagination.total, 0);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let state = test_state().await;
        let (status, _) = get(State(state), Path("nope".to_string())).await.expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
