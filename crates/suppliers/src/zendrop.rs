use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use dropshop_core::config::ZendropConfig;
use dropshop_core::domain::candidate::{CandidateProduct, SupplierKind};

use crate::fields::{count, list, number, stock, text};
use crate::{read_json, SearchQuery, SupplierClient, SupplierError, UNCATEGORIZED};

const SUPPLIER: SupplierKind = SupplierKind::Zendrop;

pub struct ZendropClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl ZendropClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), api_key }
    }

    pub fn from_config(http: reqwest::Client, config: &ZendropConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self::new(http, &config.base_url, api_key))
    }
}

#[async_trait]
impl SupplierClient for ZendropClient {
    fn kind(&self) -> SupplierKind {
        SUPPLIER
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateProduct>, SupplierError> {
        debug!(event_name = "supplier.zendrop.search", keyword = %query.keyword(), limit = query.limit);
        let response = self
            .http
            .get(format!("{}/products", self.base_url))
            .query(&[
                ("search", query.keyword()),
                ("per_page", query.limit.to_string()),
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

/// Decodes `{data: [...], pagination}`.
pub fn parse_page(body: &Value) -> Result<Vec<CandidateProduct>, SupplierError> {
    let items = body.get("data").and_then(Value::as_array).ok_or_else(|| SupplierError::Decode {
        supplier: SUPPLIER,
        message: "response has no data array".to_string(),
    })?;
    Ok(items.iter().filter_map(map_product).collect())
}

pub fn map_product(item: &Value) -> Option<CandidateProduct> {
    let id = text(item, &["id"])?;
    let name = text(item, &["name", "title"])?;
    let price = number(item, &["price"]).unwrap_or_default();

    let mut candidate = CandidateProduct::new(SUPPLIER, id, name, price);
    candidate.description = text(item, &["description"]).unwrap_or_default();
    candidate.shipping_cost = number(item, &["shipping_cost", "shipping_price"]).unwrap_or_default();
    candidate.rating = number(item, &["rating"]).unwrap_or_default();
    candidate.review_count = count(item, &["review_count", "reviews_count"]).unwrap_or_default();
    candidate.orders_count = count(item, &["orders_count", "orders"]).unwrap_or_default();
    candidate.category =
        text(item, &["category"]).unwrap_or_else(|| UNCATEGORIZED.to_string());
    candidate.tags = list(item, &["tags"]);
    candidate.images = list(item, &["images", "image"]);
    candidate.stock = stock(item, &["inventory", "stock"]);
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_page;
    use crate::SupplierError;

    #[test]
    fn maps_page_items() {
        let body = json!({
            "data": [{
                "id": 9001,
                "name": "Posture Corrector",
                "description": "Adjustable strap",
                "price": 6.25,
                "compare_at_price": null,
                "images": ["https://cdn.example.com/p1.jpg", "https://cdn.example.com/p2.jpg"],
                "inventory": 320,
                "category": "Health",
                "sku": "ZD-9001"
            }],
            "pagination": {"page": 1, "per_page": 20, "total": 1, "total_pages": 1}
        });

        let candidates = parse_page(&body).expect("parsed");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].external_id, "9001");
        assert_eq!(candidates[0].price, 6.25);
        assert_eq!(candidates[0].images.len(), 2);
        assert_eq!(candidates[0].stock, Some(320));
        assert_eq!(candidates[0].category, "Health");
    }

    #[test]
    fn body_without_data_is_a_decode_error() {
        let error = parse_page(&json!({"error": "unauthorized"})).expect_err("rejected");
        assert!(matches!(error, SupplierError::Decode { .. }));
    }
}
