//! Product selection heuristic.
//!
//! Scores supplier candidates on rating, margin, demand velocity and review
//! sentiment, then decides which ones are worth stocking. Everything here is
//! pure: no I/O, no clocks, no randomness.

mod analyzer;
mod sentiment;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::candidate::CandidateProduct;

pub use analyzer::{BatchAnalysis, ProductAnalyzer};
pub use sentiment::{KeywordSentiment, SentimentModel};

/// Formula constants. Kept apart from the thresholds in [`SelectionCriteria`]
/// so tuning weights never changes what "approved" means.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringModel {
    pub suggested_price_multiplier: f64,
    pub hot_velocity: f64,
    pub hot_min_orders: u32,
    pub hot_min_rating: f64,
    pub steady_velocity: f64,
    pub rating_weight: f64,
    pub margin_weight: f64,
    /// Margin (percent) that earns the full margin weight.
    pub full_margin_credit: f64,
    pub hot_points: f64,
    pub steady_points: f64,
    pub low_points: f64,
    pub sentiment_weight: f64,
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            suggested_price_multiplier: 2.5,
            hot_velocity: 5000.0,
            hot_min_orders: 1000,
            hot_min_rating: 4.8,
            steady_velocity: 500.0,
            rating_weight: 30.0,
            margin_weight: 30.0,
            full_margin_credit: 50.0,
            hot_points: 25.0,
            steady_points: 15.0,
            low_points: 5.0,
            sentiment_weight: 15.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    pub min_rating: f64,
    pub min_profit_margin: f64,
    pub min_orders: u32,
    pub min_review_count: u32,
    pub max_shipping_cost: f64,
    pub sentiment_threshold: f64,
    pub exclude_categories: Vec<String>,
    pub required_keywords: Vec<String>,
    pub banned_keywords: Vec<String>,
    pub max_products_per_run: usize,
    pub model: ScoringModel,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            min_rating: 4.5,
            min_profit_margin: 35.0,
            min_orders: 100,
            min_review_count: 20,
            max_shipping_cost: 5.0,
            sentiment_threshold: 0.1,
            exclude_categories: vec![
                "Used".to_string(),
                "Refurbished".to_string(),
                "Clearance".to_string(),
            ],
            required_keywords: Vec::new(),
            banned_keywords: vec![
                "fake".to_string(),
                "replica".to_string(),
                "knockoff".to_string(),
                "defective".to_string(),
                "broken".to_string(),
            ],
            max_products_per_run: 50,
            model: ScoringModel::default(),
        }
    }
}

impl SelectionCriteria {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=5.0).contains(&self.min_rating) {
            return Err("min_rating must be within 0..=5".to_string());
        }
        if !self.min_profit_margin.is_finite() || self.min_profit_margin > 100.0 {
            return Err("min_profit_margin must be a finite percentage at most 100".to_string());
        }
        if !(-1.0..=1.0).contains(&self.sentiment_threshold) {
            return Err("sentiment_threshold must be within -1..=1".to_string());
        }
        if !self.max_shipping_cost.is_finite() || self.max_shipping_cost < 0.0 {
            return Err("max_shipping_cost must be a non-negative number".to_string());
        }
        if self.max_products_per_run == 0 {
            return Err("max_products_per_run must be greater than zero".to_string());
        }
        if !(self.model.suggested_price_multiplier.is_finite()
            && self.model.suggested_price_multiplier > 0.0)
        {
            return Err("model.suggested_price_multiplier must be greater than zero".to_string());
        }
        if self.model.full_margin_credit <= 0.0 {
            return Err("model.full_margin_credit must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Candidates in an excluded category or missing every required keyword
    /// never reach scoring.
    pub fn admits(&self, candidate: &CandidateProduct) -> bool {
        let category = candidate.category.to_lowercase();
        if self
            .exclude_categories
            .iter()
            .any(|excluded| category.contains(&excluded.to_lowercase()))
        {
            return false;
        }

        if self.required_keywords.is_empty() {
            return true;
        }
        let name = candidate.name.to_lowercase();
        self.required_keywords.iter().any(|keyword| name.contains(&keyword.to_lowercase()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandLevel {
    Hot,
    Steady,
    Low,
}

impl DemandLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Steady => "STEADY",
            Self::Low => "LOW",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HOT" => Some(Self::Hot),
            "STEADY" => Some(Self::Steady),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub candidate: CandidateProduct,
    pub ai_score: u8,
    pub profit_margin: f64,
    pub sentiment_score: f64,
    pub demand_level: DemandLevel,
    pub is_winner: bool,
    pub recommendation_reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub decision: Decision,
    pub product: ScoredProduct,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendation: String,
}

impl ProductAnalysis {
    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approved
    }

    pub fn ai_score(&self) -> u8 {
        self.product.ai_score
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_analyzed: usize,
    pub approved: usize,
    pub rejected: usize,
    pub hot_trends: usize,
    /// Mean score of approved products, rounded; 0 when none were approved.
    pub average_score: u32,
    pub total_profit_potential: f64,
}

impl RunStats {
    pub fn from_analyses(analyses: &[ProductAnalysis]) -> Self {
        let approved: Vec<&ProductAnalysis> =
            analyses.iter().filter(|analysis| analysis.is_approved()).collect();
        let hot_trends = approved
            .iter()
            .filter(|analysis| analysis.product.demand_level == DemandLevel::Hot)
            .count();
        let average_score = if approved.is_empty() {
            0
        } else {
            let total: u32 = approved.iter().map(|analysis| u32::from(analysis.ai_score())).sum();
            (f64::from(total) / approved.len() as f64).round() as u32
        };
        let total_profit_potential =
            approved.iter().map(|analysis| analysis.product.profit_margin * 10.0).sum();

        Self {
            total_analyzed: analyses.len(),
            approved: approved.len(),
            rejected: analyses.len() - approved.len(),
            hot_trends,
            average_score,
            total_profit_potential,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringError {
    #[error("invalid candidate `{external_id}`: {field} {reason}")]
    InvalidInput { external_id: String, field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::{Decision, DemandLevel, SelectionCriteria};
    use crate::domain::candidate::{CandidateProduct, SupplierKind};

    #[test]
    fn default_criteria_are_valid() {
        assert!(SelectionCriteria::default().validate().is_ok());
    }

    #[test]
    fn criteria_reject_out_of_range_thresholds() {
        let criteria = SelectionCriteria { min_rating: 6.0, ..SelectionCriteria::default() };
        assert!(criteria.validate().is_err());

        let criteria =
            SelectionCriteria { max_products_per_run: 0, ..SelectionCriteria::default() };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn excluded_categories_match_case_insensitive_substrings() {
        let criteria = SelectionCriteria::default();
        let mut candidate = CandidateProduct::new(SupplierKind::Cj, "1", "Phone", 10.0);
        candidate.category = "Electronics / refurbished".to_string();
        assert!(!criteria.admits(&candidate));

        candidate.category = "Electronics".to_string();
        assert!(criteria.admits(&candidate));
    }

    #[test]
    fn required_keywords_filter_only_when_configured() {
        let candidate = CandidateProduct::new(SupplierKind::Cj, "1", "Pet Water Fountain", 10.0);
        let criteria = SelectionCriteria {
            required_keywords: vec!["fountain".to_string()],
            ..SelectionCriteria::default()
        };
        assert!(criteria.admits(&candidate));

        let criteria = SelectionCriteria {
            required_keywords: vec!["lamp".to_string()],
            ..SelectionCriteria::default()
        };
        assert!(!criteria.admits(&candidate));
    }

    #[test]
    fn enum_labels_round_trip_through_storage_strings() {
        assert_eq!(Decision::parse(Decision::Approved.as_str()), Some(Decision::Approved));
        assert_eq!(DemandLevel::parse("STEADY"), Some(DemandLevel::Steady));
        assert_eq!(DemandLevel::parse("steady"), None);
    }
}
