use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierKind {
    Cj,
    Zendrop,
    Appscenic,
    Manual,
}

impl SupplierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cj => "cj",
            Self::Zendrop => "zendrop",
            Self::Appscenic => "appscenic",
            Self::Manual => "manual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cj" | "cjdropshipping" => Some(Self::Cj),
            "zendrop" => Some(Self::Zendrop),
            "appscenic" => Some(Self::Appscenic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for SupplierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supplier-sourced product record, held only for the duration of an import run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateProduct {
    pub external_id: String,
    pub supplier: SupplierKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub shipping_cost: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub orders_count: u32,
    #[serde(default = "uncategorized")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    /// Review texts, when the supplier exposes them.
    #[serde(default)]
    pub reviews: Vec<String>,
}

pub(crate) fn uncategorized() -> String {
    "Uncategorized".to_string()
}

impl CandidateProduct {
    pub fn new(
        supplier: SupplierKind,
        external_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            supplier,
            name: name.into(),
            description: String::new(),
            price,
            shipping_cost: 0.0,
            rating: 0.0,
            review_count: 0,
            orders_count: 0,
            category: uncategorized(),
            tags: Vec::new(),
            images: Vec::new(),
            stock: None,
            reviews: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CandidateProduct, SupplierKind};

    #[test]
    fn supplier_kind_parses_aliases() {
        assert_eq!(SupplierKind::parse("CJDropshipping"), Some(SupplierKind::Cj));
        assert_eq!(SupplierKind::parse(" zendrop "), Some(SupplierKind::Zendrop));
        assert_eq!(SupplierKind::parse("aliexpress"), None);
    }

    #[test]
    fn candidate_json_defaults_optional_fields() {
        let candidate: CandidateProduct = serde_json::from_str(
            r#"{"external_id":"cj-1","supplier":"cj","name":"Phone Stand","price":4.5}"#,
        )
        .expect("candidate should deserialize");

        assert_eq!(candidate.category, "Uncategorized");
        assert_eq!(candidate.orders_count, 0);
        assert!(candidate.reviews.is_empty());
        assert!(candidate.stock.is_none());
    }
}
