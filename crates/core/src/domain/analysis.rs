use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::candidate::SupplierKind;
use crate::intelligence::{Decision, DemandLevel, ProductAnalysis};

/// One scored candidate within an import run. Rows are append-only and double
/// as the daily dedup record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLogEntry {
    pub id: String,
    pub run_id: String,
    pub supplier: SupplierKind,
    pub external_id: String,
    pub product_name: String,
    pub decision: Decision,
    pub ai_score: u8,
    pub profit_margin: f64,
    pub sentiment_score: f64,
    pub demand_level: DemandLevel,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendation: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisLogEntry {
    pub fn from_analysis(run_id: &str, analysis: &ProductAnalysis, now: DateTime<Utc>) -> Self {
        let product = &analysis.product;
        Self {
            id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            supplier: product.candidate.supplier,
            external_id: product.candidate.external_id.clone(),
            product_name: product.candidate.name.clone(),
            decision: analysis.decision,
            ai_score: product.ai_score,
            profit_margin: product.profit_margin,
            sentiment_score: product.sentiment_score,
            demand_level: product.demand_level,
            reasons: analysis.reasons.clone(),
            warnings: analysis.warnings.clone(),
            recommendation: analysis.recommendation.clone(),
            analyzed_at: now,
        }
    }
}
