use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use dropshop_core::config::CjConfig;
use dropshop_core::domain::candidate::{CandidateProduct, SupplierKind};
use dropshop_core::signing::cj_signature;

use crate::fields::{count, list, number, stock, text};
use crate::{read_json, SearchQuery, SupplierClient, SupplierError, UNCATEGORIZED};

const SUPPLIER: SupplierKind = SupplierKind::Cj;

/// CJDropshipping product search, signed per request with the account secret.
pub struct CjClient {
    http: reqwest::Client,
    base_url: String,
    app_key: String,
    secret_key: SecretString,
}

impl CjClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        app_key: impl Into<String>,
        secret_key: SecretString,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_key: app_key.into(),
            secret_key,
        }
    }

    /// `None` unless both the app key and secret are set.
    pub fn from_config(http: reqwest::Client, config: &CjConfig) -> Option<Self> {
        let app_key = config.app_key.clone()?;
        let secret_key = config.secret_key.clone()?;
        Some(Self::new(http, &config.base_url, app_key, secret_key))
    }
}

#[async_trait]
impl SupplierClient for CjClient {
    fn kind(&self) -> SupplierKind {
        SUPPLIER
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateProduct>, SupplierError> {
        let timestamp = Utc::now().timestamp_millis();
        let sign = cj_signature(&self.app_key, self.secret_key.expose_secret(), timestamp);
        let url = format!("{}/api/v1/product/list", self.base_url);

        debug!(event_name = "supplier.cj.search", keyword = %query.keyword(), limit = query.limit);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("keyword", query.keyword()),
                ("pageSize", query.limit.to_string()),
                ("pageNum", "1".to_string()),
            ])
            .header("X-App-Key", &self.app_key)
            .header("X-Timestamp", timestamp.to_string())
            .header("X-Sign", sign)
            .send()
            .await
            .map_err(|source| SupplierError::Http { supplier: SUPPLIER, source })?;

        let body = read_json(SUPPLIER, response).await?;
        parse_list(&body)
    }
}

/// Decodes `{success, message, data: {list: [...]}}`.
pub fn parse_list(body: &Value) -> Result<Vec<CandidateProduct>, SupplierError> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        let message = text(body, &["message"]).unwrap_or_else(|| "request unsuccessful".to_string());
        return Err(SupplierError::Api { supplier: SUPPLIER, message });
    }

    let items = body
        .get("data")
        .and_then(|data| data.get("list"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(items.iter().filter_map(map_product).collect())
}

/// Items without an id or name are skipped.
pub fn map_product(item: &Value) -> Option<CandidateProduct> {
    let id = text(item, &["pid", "id"])?;
    let name = text(item, &["productNameEn", "productName", "name"])?;
    let price = number(item, &["sellPrice", "price"]).unwrap_or_default();

    let mut candidate = CandidateProduct::new(SUPPLIER, id, name, price);
    candidate.description = text(item, &["description"]).unwrap_or_default();
    candidate.shipping_cost = number(item, &["shippingPrice", "shippingCost"]).unwrap_or_default();
    candidate.rating = number(item, &["rating", "score"]).unwrap_or_default();
    candidate.review_count = count(item, &["reviewCount", "reviews"]).unwrap_or_default();
    candidate.orders_count = count(item, &["listedNum", "ordersCount", "orders"]).unwrap_or_default();
    candidate.category = text(item, &["categoryName", "category"])
        .unwrap_or_else(|| UNCATEGORIZED.to_string());
    candidate.images = list(item, &["productImage", "image", "mainImage"]);
    candidate.stock = stock(item, &["stock", "quantity"]);
    Some(candidate)
}
