use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::candidate::SupplierKind;
use crate::intelligence::ScoredProduct;

/// Stock assumed for imported products when the supplier reports none.
pub const DEFAULT_IMPORT_STOCK: i64 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog row. Never physically deleted in normal flow; `active = false`
/// hides it from the storefront.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub category: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub stock_quantity: i64,
    pub active: bool,
    pub source: SupplierKind,
    pub external_id: Option<String>,
    pub ai_score: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin-supplied fields for creating or replacing a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

fn default_active() -> bool {
    true
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name is required".to_string());
        }
        if self.price <= Decimal::ZERO {
            return Err("product price must be greater than zero".to_string());
        }
        if self.stock_quantity < 0 {
            return Err("stock quantity cannot be negative".to_string());
        }
        Ok(())
    }

    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> StoredProduct {
        StoredProduct {
            slug: slugify(&self.name),
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            compare_at_price: self.compare_at_price,
            cost_price: self.cost_price,
            shipping_cost: self.shipping_cost,
            category: self.category,
            tags: self.tags,
            images: self.images,
            stock_quantity: self.stock_quantity,
            active: self.active,
            source: SupplierKind::Manual,
            external_id: None,
            ai_score: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl StoredProduct {
    /// Builds the catalog row for an approved candidate. Sell price is the cost
    /// times `price_multiplier`; compare-at sits 30% above the sell price.
    pub fn from_scored(
        scored: &ScoredProduct,
        price_multiplier: f64,
        now: DateTime<Utc>,
    ) -> StoredProduct {
        let candidate = &scored.candidate;
        let cost = decimal_from(candidate.price);
        let price = (cost * decimal_from(price_multiplier)).round_dp(2);
        let compare_at = (price * Decimal::new(13, 1)).round_dp(2);

        StoredProduct {
            id: ProductId::generate(),
            name: candidate.name.trim().to_string(),
            slug: slugify(&candidate.name),
            description: candidate.description.clone(),
            price,
            compare_at_price: Some(compare_at),
            cost_price: Some(cost),
            shipping_cost: Some(decimal_from(candidate.shipping_cost)),
            category: candidate.category.clone(),
            tags: candidate.tags.clone(),
            images: candidate.images.clone(),
            stock_quantity: candidate.stock.unwrap_or(DEFAULT_IMPORT_STOCK).max(0),
            active: true,
            source: candidate.supplier,
            external_id: Some(candidate.external_id.clone()),
            ai_score: Some(scored.ai_score),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields, keeping identity and supplier linkage.
    pub fn apply_draft(&mut self, draft: ProductDraft, now: DateTime<Utc>) {
        self.slug = slugify(&draft.name);
        self.name = draft.name.trim().to_string();
        self.description = draft.description;
        self.price = draft.price;
        self.compare_at_price = draft.compare_at_price;
        self.cost_price = draft.cost_price;
        self.shipping_cost = draft.shipping_cost;
        self.category = draft.category;
        self.tags = draft.tags;
        self.images = draft.images;
        self.stock_quantity = draft.stock_quantity;
        self.active = draft.active;
        self.updated_at = now;
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = now;
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Percentage saved against the compare-at price, when one is set above the price.
    pub fn discount_pct(&self) -> Option<Decimal> {
        let compare_at = self.compare_at_price?;
        if compare_at <= self.price || compare_at <= Decimal::ZERO {
            return None;
        }
        Some(((compare_at - self.price) / compare_at * Decimal::ONE_HUNDRED).round_dp(0))
    }
}

fn decimal_from(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default().round_dp(4)
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "product".to_string()
    } else {
        slug
    }
}
