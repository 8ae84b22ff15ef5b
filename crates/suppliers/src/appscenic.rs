use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use dropshop_core::config::AppScenicConfig;
use dropshop_core::domain::candidate::{CandidateProduct, SupplierKind};

use crate::fields::{count, list, number, stock, text};
use crate::{read_json, SearchQuery, SupplierClient, SupplierError, UNCATEGORIZED};

const SUPPLIER: SupplierKind = SupplierKind::Appscenic;

pub struct AppScenicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl AppScenicClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), api_key }
    }

    pub fn from_config(http: reqwest::Client, config: &AppScenicConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self::new(http, &config.base_url, api_key))
    }
}

#[async_trait]
impl SupplierClient for AppScenicClient {
    fn kind(&self) -> SupplierKind {
        SUPPLIER
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateProduct>, SupplierError> {
        debug!(event_name = "supplier.appscenic.search", keyword = %query.keyword(), limit = query.limit);
        let response = self
            .http
            .get(format!("{}/products", self.base_url))
            .query(&[
                ("search", query.keyword()),
                ("limit", query.limit.to_string()),
                ("page", "1".to_string()),
            ])
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|source| SupplierError::Http { supplier: SUPPLIER, source })?;

        let body = read_json(SUPPLIER, response).await?;
        parse_page(&body)
    }
}

/// Decodes `{products: [...], total, page}`.
pub fn parse_page(body: &Value) -> Result<Vec<CandidateProduct>, SupplierError> {
    let items =
        body.get("products").and_then(Value::as_array).ok_or_else(|| SupplierError::Decode {
            supplier: SUPPLIER,
            message: "response has no products array".to_string(),
        })?;
    Ok(items.iter().filter_map(map_product).collect())
}

pub fn map_product(item: &Value) -> Option<CandidateProduct> {
    let id = text(item, &["id", "sku"])?;
    let name = text(item, &["name"])?;
    let price = number(item, &["price"]).unwrap_or_default();

    let mut candidate = CandidateProduct::new(SUPPLIER, id, name, price);
    candidate.description = text(item, &["description"]).unwrap_or_default();
    candidate.shipping_cost = number(item, &["shipping_cost"]).unwrap_or_default();
    candidate.rating = number(item, &["rating"]).unwrap_or_default();
    candidate.review_count = count(item, &["review_count"]).unwrap_or_default();
    candidate.orders_count = count(item, &["orders_count", "sales"]).unwrap_or_default();
    candidate.category =
        text(item, &["category"]).unwrap_or_else(|| UNCATEGORIZED.to_string());
    candidate.tags = list(item, &["tags"]);
    candidate.images = list(item, &["images"]);
    candidate.stock = stock(item, &["inventory"]);
    Some(candidate)
}
