//! Public catalog routes.
//!
//! HTML:
//! - `GET /`                    newest active products
//! - `GET /products`            paged listing with category and search filters
//! - `GET /products/{id}`       product detail
//!
//! JSON:
//! - `GET /api/products`        paged listing
//! - `GET /api/products/{id}`   active product
//! - `GET /api/categories`      active categories with counts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use dropshop_core::domain::product::{ProductId, StoredProduct};
use dropshop_db::repositories::{CategoryCount, ProductQuery, ProductRepository};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::error;

use crate::api::{not_found, repository_failure, ApiResult, PageParams, PageWindow, Pagination};
use crate::state::AppState;
use crate::templates::STORE_NAME;

const HOME_PRODUCT_COUNT: u32 = 12;

type HtmlFailure = (StatusCode, Html<String>);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/products", get(product_listing))
        .route("/products/{id}", get(product_page))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/categories", get(list_categories))
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CatalogParams {
    fn window(&self) -> PageWindow {
        PageParams { page: self.page, per_page: self.per_page }.window()
    }

    fn category(&self) -> Option<String> {
        non_blank(self.category.as_deref())
    }

    fn search(&self) -> Option<String> {
        non_blank(self.search.as_deref())
    }

    fn query(&self, window: PageWindow) -> ProductQuery {
        ProductQuery {
            active_only: true,
            category: self.category(),
            search: self.search(),
            limit: window.per_page,
            offset: window.offset(),
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<StoredProduct>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: StoredProduct,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<CategoryCount>,
}

async fn active_product(
    products: &dyn ProductRepository,
    id: &str,
) -> Result<Option<StoredProduct>, dropshop_db::repositories::RepositoryError> {
    let product = products.find_by_id(&ProductId(id.to_string())).await?;
    Ok(product.filter(|product| product.active))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> ApiResult<ProductListResponse> {
    let window = params.window();
    let query = params.query(window);
    let products = state.products.list(&query).await.map_err(repository_failure)?;
    let total = state.products.count(&query).await.map_err(repository_failure)?;

    Ok(Json(ProductListResponse { success: true, products, pagination: window.pagination(total) }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ProductResponse> {
    match active_product(state.products.as_ref(), &id).await.map_err(repository_failure)? {
        Some(product) => Ok(Json(ProductResponse { success: true, product })),
        None => Err(not_found("product", id)),
    }
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<CategoriesResponse> {
    let categories = state.products.categories().await.map_err(repository_failure)?;
    Ok(Json(CategoriesResponse { success: true, categories }))
}

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, HtmlFailure> {
    let query = ProductQuery { active_only: true, limit: HOME_PRODUCT_COUNT, ..ProductQuery::default() };
    let products = state.products.list(&query).await.map_err(html_database_error)?;
    let categories = state.products.categories().await.map_err(html_database_error)?;

    let mut context = base_context();
    context.insert("products", &products);
    context.insert("categories", &categories);
    render(&state.templates, "index.html", &context)
}

pub async fn product_listing(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Html<String>, HtmlFailure> {
    let window = params.window();
    let query = params.query(window);
    let products = state.products.list(&query).await.map_err(html_database_error)?;
    let total = state.products.count(&query).await.map_err(html_database_error)?;

    let mut context = base_context();
    context.insert("products", &products);
    context.insert("pagination", &window.pagination(total));
    context.insert("category", &query.category);
    context.insert("search", &query.search);
    context.insert("query_suffix", &query_suffix(&query, window));
    render(&state.templates, "products.html", &context)
}

pub async fn product_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HtmlFailure> {
    let product =
        active_product(state.products.as_ref(), &id).await.map_err(html_database_error)?;

    let Some(product) = product else {
        let page = render(&state.templates, "not_found.html", &base_context())?;
        return Err((StatusCode::NOT_FOUND, page));
    };

    let mut context = base_context();
    context.insert("discount_pct", &product.discount_pct());
    context.insert("product", &product);
    render(&state.templates, "product.html", &context)
}

/// Filter and page-size parameters carried across pager links.
fn query_suffix(query: &ProductQuery, window: PageWindow) -> String {
    let mut suffix = format!("&per_page={}", window.per_page);
    if let Some(category) = &query.category {
        suffix.push_str(&format!("&category={}", urlencoding::encode(category)));
    }
    if let Some(search) = &query.search {
        suffix.push_str(&format!("&search={}", urlencoding::encode(search)));
    }
    suffix
}

fn base_context() -> Context {
    let mut context = Context::new();
    context.insert("store_name", STORE_NAME);
    context
}

fn render(templates: &Tera, name: &str, context: &Context) -> Result<Html<String>, HtmlFailure> {
    templates.render(name, context).map(Html).map_err(|err| {
        error!(event_name = "storefront.render.failed", template = name, error = ?err, "template render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Something went wrong</h1>".to_string()))
    })
}

fn html_database_error(err: dropshop_db::repositories::RepositoryError) -> HtmlFailure {
    error!(event_name = "storefront.database.failed", error = %err, "catalog query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Something went wrong</h1>".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use chrono::Utc;
    use dropshop_db::repositories::ProductQuery;

    use super::{
        get_product, home, list_categories, list_products, product_listing, product_page,
        query_suffix, CatalogParams,
    };
    use crate::api::PageWindow;
    use crate::state::test_support::{seed_product, test_state};

    #[tokio::test]
    async fn api_listing_hides_inactive_products_and_paginates() {
        let state = test_state().await;
        seed_product(&state, "Desk Lamp", 2999).await;
        seed_product(&state, "Floor Lamp", 5999).await;
        let mut hidden = seed_product(&state, "Old Lamp", 999).await;
        hidden.deactivate(Utc::now());
        state.products.save(hidden).await.expect("deactivate");

        let Json(body) = list_products(
            State(state.clone()),
            Query(CatalogParams { per_page: Some(1), ..CatalogParams::default() }),
        )
        .await
        .expect("listing");

        assert!(body.success);
        assert_eq!(body.products.len(), 1);
        assert_eq!(body.pagination.total, 2);
        assert_eq!(body.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn api_search_matches_name() {
        let state = test_state().await;
        seed_product(&state, "Desk Lamp", 2999).await;
        seed_product(&state, "Yoga Mat", 1999).await;

        let Json(body) = list_products(
            State(state),
            Query(CatalogParams { search: Some("yoga".to_string()), ..CatalogParams::default() }),
        )
        .await
        .expect("listing");

        assert_eq!(body.products.len(), 1);
        assert_eq!(body.products[0].name, "Yoga Mat");
    }

    #[tokio::test]
    async fn inactive_product_is_not_found() {
        let state = test_state().await;
        let mut product = seed_product(&state, "Desk Lamp", 2999).await;
        let Json(found) =
            get_product(State(state.clone()), Path(product.id.0.clone())).await.expect("found");
        assert_eq!(found.product.id, product.id);

        product.deactivate(Utc::now());
        state.products.save(product.clone()).await.expect("save");

        let (status, Json(error)) =
            get_product(State(state), Path(product.id.0)).await.expect_err("hidden");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!error.success);
    }

    #[tokio::test]
    async fn categories_count_active_products() {
        let state = test_state().await;
        seed_product(&state, "Desk Lamp", 2999).await;
        seed_product(&state, "Floor Lamp", 5999).await;

        let Json(body) = list_categories(State(state)).await.expect("categories");
        assert_eq!(body.categories.len(), 1);
        assert_eq!(body.categories[0].category, "Home");
        assert_eq!(body.categories[0].product_count, 2);
    }

    #[tokio::test]
    async fn html_pages_render_products() {
        let state = test_state().await;
        let product = seed_product(&state, "Desk Lamp", 2999).await;

        let page = home(State(state.clone())).await.expect("home");
        assert!(page.0.contains("Desk Lamp"));

        let page = product_listing(State(state.clone()), Query(CatalogParams::default()))
            .await
            .expect("listing");
        assert!(page.0.contains("1 products"));

        let page = product_page(State(state.clone()), Path(product.id.0)).await.expect("detail");
        assert!(page.0.contains("29.99"));

        let (status, page) =
            product_page(State(state), Path("missing".to_string())).await.expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(page.0.contains("Product not found"));
    }

    #[test]
    fn pager_links_escape_filters() {
        let query = ProductQuery {
            category: Some("Home & Garden".to_string()),
            search: Some("desk lamp?".to_string()),
            ..ProductQuery::default()
        };

        let suffix = query_suffix(&query, PageWindow { page: 2, per_page: 12 });
        assert_eq!(suffix, "&per_page=12&category=Home%20%26%20Garden&search=desk%20lamp%3F");
    }
}
