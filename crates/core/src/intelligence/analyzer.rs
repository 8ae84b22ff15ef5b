use serde::Serialize;

use super::sentiment::{KeywordSentiment, SentimentModel};
use super::{
    Decision, DemandLevel, ProductAnalysis, RunStats, ScoredProduct, ScoringError,
    SelectionCriteria,
};
use crate::domain::candidate::CandidateProduct;

pub struct ProductAnalyzer {
    criteria: SelectionCriteria,
    sentiment: Box<dyn SentimentModel>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchAnalysis {
    pub analyses: Vec<ProductAnalysis>,
    pub invalid: Vec<ScoringError>,
    /// Dropped by category or keyword filters.
    pub filtered: usize,
    /// Dropped by the per-run cap after filtering.
    pub truncated: usize,
    pub stats: RunStats,
}

struct Profitability {
    margin: f64,
    profitable: bool,
}

impl ProductAnalyzer {
    pub fn new(criteria: SelectionCriteria) -> Self {
        Self::with_sentiment(criteria, Box::new(KeywordSentiment))
    }

    pub fn with_sentiment(criteria: SelectionCriteria, sentiment: Box<dyn SentimentModel>) -> Self {
        Self { criteria, sentiment }
    }

    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    pub fn analyze(&self, candidate: &CandidateProduct) -> Result<ProductAnalysis, ScoringError> {
        validate_candidate(candidate)?;

        let criteria = &self.criteria;
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        if candidate.rating < criteria.min_rating {
            warnings.push(format!(
                "rating {} is below the required {}",
                candidate.rating, criteria.min_rating
            ));
        }

        if self.has_banned_keyword(&candidate.name) {
            return Ok(ProductAnalysis {
                decision: Decision::Rejected,
                product: ScoredProduct {
                    candidate: candidate.clone(),
                    ai_score: 0,
                    profit_margin: 0.0,
                    sentiment_score: 0.0,
                    demand_level: DemandLevel::Low,
                    is_winner: false,
                    recommendation_reason: "contains banned keywords".to_string(),
                },
                reasons: vec!["name contains a banned keyword".to_string()],
                warnings,
                recommendation: "reject: banned keyword in product name".to_string(),
            });
        }

        let profitability = self.profitability(candidate.price, candidate.shipping_cost);
        if profitability.profitable {
            reasons.push(format!("strong profitability at {}% margin", profitability.margin));
        } else {
            reasons.push(format!(
                "profit margin {}% is below the required {}%",
                profitability.margin, criteria.min_profit_margin
            ));
        }

        let sentiment = if candidate.reviews.is_empty() {
            self.sentiment.score(&self.sentiment.fallback_reviews(candidate.rating))
        } else {
            self.sentiment.score(&candidate.reviews)
        };
        if sentiment < criteria.sentiment_threshold {
            warnings.push(format!(
                "sentiment {:.2} is below the threshold {}",
                sentiment, criteria.sentiment_threshold
            ));
        }
        if candidate.review_count < criteria.min_review_count {
            warnings.push(format!(
                "review count {} is below the minimum {}",
                candidate.review_count, criteria.min_review_count
            ));
        }
        if candidate.shipping_cost > criteria.max_shipping_cost {
            warnings.push(format!(
                "shipping cost {} exceeds the maximum {}",
                candidate.shipping_cost, criteria.max_shipping_cost
            ));
        }

        let demand = self.demand_level(candidate);
        match demand {
            DemandLevel::Hot => reasons.push("hot product trending in the market".to_string()),
            DemandLevel::Steady => reasons.push("steady seller with consistent sales".to_string()),
            DemandLevel::Low => {}
        }

        let ai_score = self.score(candidate.rating, profitability.margin, demand, sentiment);
        let is_winner = candidate.rating >= criteria.min_rating
            && profitability.profitable
            && candidate.orders_count >= criteria.min_orders
            && sentiment >= criteria.sentiment_threshold;

        let recommendation = if is_winner {
            format!("winning product, AI score {ai_score}/100")
        } else {
            "product does not meet the selection criteria".to_string()
        };

        Ok(ProductAnalysis {
            decision: if is_winner { Decision::Approved } else { Decision::Rejected },
            product: ScoredProduct {
                candidate: candidate.clone(),
                ai_score,
                profit_margin: profitability.margin,
                sentiment_score: sentiment,
                demand_level: demand,
                is_winner,
                recommendation_reason: reasons.join(" | "),
            },
            reasons,
            warnings,
            recommendation,
        })
    }

    /// Applies the category and keyword filters, then the per-run cap.
    /// Returns the admitted candidates with the filtered and truncated counts.
    pub fn select<'a>(
        &self,
        candidates: &'a [CandidateProduct],
    ) -> (Vec<&'a CandidateProduct>, usize, usize) {
        let admitted: Vec<&CandidateProduct> =
            candidates.iter().filter(|candidate| self.criteria.admits(candidate)).collect();
        let filtered = candidates.len() - admitted.len();
        let cap = self.criteria.max_products_per_run;
        let truncated = admitted.len().saturating_sub(cap);
        (admitted.into_iter().take(cap).collect(), filtered, truncated)
    }

    pub fn analyze_batch(&self, candidates: &[CandidateProduct]) -> BatchAnalysis {
        let (selected, filtered, truncated) = self.select(candidates);
        let mut batch = BatchAnalysis { filtered, truncated, ..BatchAnalysis::default() };

        for candidate in selected {
            match self.analyze(candidate) {
                Ok(analysis) => batch.analyses.push(analysis),
                Err(error) => batch.invalid.push(error),
            }
        }
        batch.stats = RunStats::from_analyses(&batch.analyses);
        batch
    }

    pub fn suggested_price(&self, cost: f64) -> f64 {
        cost * self.criteria.model.suggested_price_multiplier
    }

    fn has_banned_keyword(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.criteria.banned_keywords.iter().any(|keyword| lower.contains(&keyword.to_lowercase()))
    }

    fn profitability(&self, price: f64, shipping_cost: f64) -> Profitability {
        let suggested = self.suggested_price(price);
        let margin = if suggested > 0.0 {
            let raw = (suggested - (price + shipping_cost)) / suggested * 100.0;
            (raw * 100.0).round() / 100.0
        } else {
            0.0
        };
        Profitability { margin, profitable: margin >= self.criteria.min_profit_margin }
    }

    fn demand_level(&self, candidate: &CandidateProduct) -> DemandLevel {
        let model = &self.criteria.model;
        let orders = f64::from(candidate.orders_count);
        let velocity = orders * (f64::from(candidate.review_count) / 10.0) * candidate.rating;

        if velocity > model.hot_velocity
            && candidate.orders_count > model.hot_min_orders
            && candidate.rating >= model.hot_min_rating
        {
            DemandLevel::Hot
        } else if velocity > model.steady_velocity
            && candidate.orders_count >= self.criteria.min_orders
        {
            DemandLevel::Steady
        } else {
            DemandLevel::Low
        }
    }

    fn score(&self, rating: f64, margin: f64, demand: DemandLevel, sentiment: f64) -> u8 {
        let model = &self.criteria.model;
        let rating_points = (rating / 5.0 * model.rating_weight).clamp(0.0, model.rating_weight);
        let margin_points =
            (margin / model.full_margin_credit * model.margin_weight).clamp(0.0, model.margin_weight);
        let demand_points = match demand {
            DemandLevel::Hot => model.hot_points,
            DemandLevel::Steady => model.steady_points,
            DemandLevel::Low => model.low_points,
        };
        let sentiment_points = (sentiment * model.sentiment_weight).max(0.0);

        let total = rating_points + margin_points + demand_points + sentiment_points;
        total.round().clamp(0.0, 100.0) as u8
    }
}

fn validate_candidate(candidate: &CandidateProduct) -> Result<(), ScoringError> {
    let invalid = |field: &'static str, reason: &str| ScoringError::InvalidInput {
        external_id: candidate.external_id.clone(),
        field,
        reason: reason.to_string(),
    };

    if !candidate.price.is_finite() || candidate.price < 0.0 {
        return Err(invalid("price", "must be a non-negative number"));
    }
    if !candidate.shipping_cost.is_finite() || candidate.shipping_cost < 0.0 {
        return Err(invalid("shipping_cost", "must be a non-negative number"));
    }
    if !candidate.rating.is_finite() || !(0.0..=5.0).contains(&candidate.rating) {
        return Err(invalid("rating", "must be within 0..=5"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ProductAnalyzer;
    use crate::domain::candidate::{CandidateProduct, SupplierKind};
    use crate::intelligence::{
        Decision, DemandLevel, ScoringError, SelectionCriteria, SentimentModel,
    };

    fn worked_example() -> CandidateProduct {
        let mut candidate = CandidateProduct::new(SupplierKind::Cj, "cj-100", "Posture Corrector", 20.0);
        candidate.shipping_cost = 5.0;
        candidate.rating = 4.9;
        candidate.review_count = 200;
        candidate.orders_count = 1500;
        candidate.category = "Health".to_string();
        candidate
    }

    fn analyzer() -> ProductAnalyzer {
        ProductAnalyzer::new(SelectionCriteria::default())
    }

    #[test]
    fn worked_example_is_an_approved_hot_product() {
        let analysis = analyzer().analyze(&worked_example()).expect("valid candidate");

        assert_eq!(analysis.decision, Decision::Approved);
        assert_eq!(analysis.product.profit_margin, 50.0);
        assert_eq!(analysis.product.demand_level, DemandLevel::Hot);
        assert_eq!(analysis.ai_score(), 89);
        assert!(analysis.product.is_winner);
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.recommendation, "winning product, AI score 89/100");
    }

    #[test]
    fn replica_in_name_rejects_with_zero_score() {
        let mut candidate = worked_example();
        candidate.name = "Designer Watch REPLICA".to_string();

        let analysis = analyzer().analyze(&candidate).expect("valid candidate");
        assert_eq!(analysis.decision, Decision::Rejected);
        assert_eq!(analysis.ai_score(), 0);
        assert_eq!(analysis.product.profit_margin, 0.0);
        assert_eq!(analysis.product.sentiment_score, 0.0);
        assert_eq!(analysis.product.demand_level, DemandLevel::Low);
        assert_eq!(analysis.reasons, vec!["name contains a banned keyword".to_string()]);
    }

    #[test]
    fn every_banned_keyword_rejects_regardless_of_other_fields() {
        let criteria = SelectionCriteria::default();
        let analyzer = ProductAnalyzer::new(criteria.clone());
        for keyword in &criteria.banned_keywords {
            let mut candidate = worked_example();
            candidate.name = format!("Premium {keyword} item");
            candidate.orders_count = 1_000_000;
            let analysis = analyzer.analyze(&candidate).expect("valid candidate");
            assert_eq!(analysis.decision, Decision::Rejected, "keyword {keyword}");
            assert_eq!(analysis.ai_score(), 0, "keyword {keyword}");
        }
    }

    #[test]
    fn margin_decreases_as_shipping_grows() {
        let analyzer = analyzer();
        let mut previous = f64::INFINITY;
        for shipping in [0.0, 1.0, 2.5, 5.0, 10.0, 25.0, 60.0] {
            let mut candidate = worked_example();
            candidate.shipping_cost = shipping;
            let margin = analyzer.analyze(&candidate).expect("valid").product.profit_margin;
            assert!(margin <= previous, "shipping {shipping} raised margin to {margin}");
            previous = margin;
        }
    }

    #[test]
    fn rating_below_minimum_is_rejected_with_warning() {
        let mut candidate = worked_example();
        candidate.rating = 4.4;

        let analysis = analyzer().analyze(&candidate).expect("valid candidate");
        assert_eq!(analysis.decision, Decision::Rejected);
        assert!(analysis.warnings.iter().any(|warning| warning.starts_with("rating 4.4")));
    }

    #[test]
    fn score_stays_within_bounds() {
        let analyzer = analyzer();
        for price in [0.0, 0.01, 3.0, 250.0] {
            for shipping in [0.0, 4.0, 500.0] {
                for rating in [0.0, 2.5, 4.5, 5.0] {
                    for orders in [0, 150, 100_000] {
                        let mut candidate = worked_example();
                        candidate.price = price;
                        candidate.shipping_cost = shipping;
                        candidate.rating = rating;
                        candidate.orders_count = orders;
                        candidate.review_count = orders;
                        let analysis = analyzer.analyze(&candidate).expect("valid");
                        assert!(analysis.ai_score() <= 100);
                    }
                }
            }
        }
    }

    #[test]
    fn hot_demand_requires_more_than_a_thousand_orders() {
        let analyzer = analyzer();
        let mut candidate = worked_example();
        candidate.orders_count = 1000;
        candidate.review_count = 50_000;
        let analysis = analyzer.analyze(&candidate).expect("valid");
        assert_ne!(analysis.product.demand_level, DemandLevel::Hot);

        candidate.orders_count = 1001;
        let analysis = analyzer.analyze(&candidate).expect("valid");
        assert_eq!(analysis.product.demand_level, DemandLevel::Hot);
    }

    #[test]
    fn zero_price_yields_zero_margin() {
        let mut candidate = worked_example();
        candidate.price = 0.0;
        let analysis = analyzer().analyze(&candidate).expect("valid");
        assert_eq!(analysis.product.profit_margin, 0.0);
        assert_eq!(analysis.decision, Decision::Rejected);
    }

    #[test]
    fn non_finite_or_out_of_range_inputs_are_rejected() {
        let mut candidate = worked_example();
        candidate.price = f64::NAN;
        assert!(matches!(
            analyzer().analyze(&candidate),
            Err(ScoringError::InvalidInput { field: "price", .. })
        ));

        let mut candidate = worked_example();
        candidate.rating = 5.5;
        assert!(matches!(
            analyzer().analyze(&candidate),
            Err(ScoringError::InvalidInput { field: "rating", .. })
        ));
    }

    #[test]
    fn supplied_reviews_replace_fallback_texts() {
        let mut candidate = worked_example();
        candidate.reviews = vec!["terrible, broken on arrival, total scam".to_string()];

        let analysis = analyzer().analyze(&candidate).expect("valid");
        assert!(analysis.product.sentiment_score < 0.0);
        assert_eq!(analysis.decision, Decision::Rejected);
    }

    struct Neutral;

    impl SentimentModel for Neutral {
        fn score(&self, _texts: &[String]) -> f64 {
            0.0
        }

        fn fallback_reviews(&self, _rating: f64) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn sentiment_model_is_pluggable() {
        let analyzer = ProductAnalyzer::with_sentiment(SelectionCriteria::default(), Box::new(Neutral));
        let analysis = analyzer.analyze(&worked_example()).expect("valid");

        assert_eq!(analysis.product.sentiment_score, 0.0);
        assert_eq!(analysis.ai_score(), 84);
        assert_eq!(analysis.decision, Decision::Rejected);
    }

    #[test]
    fn batch_filters_caps_and_summarizes() {
        let criteria = SelectionCriteria { max_products_per_run: 2, ..SelectionCriteria::default() };
        let analyzer = ProductAnalyzer::new(criteria);

        let mut clearance = worked_example();
        clearance.external_id = "cj-clear".to_string();
        clearance.category = "Clearance Deals".to_string();
        let mut weak = worked_example();
        weak.external_id = "cj-weak".to_string();
        weak.rating = 3.0;
        let mut overflow = worked_example();
        overflow.external_id = "cj-over".to_string();

        let batch = analyzer.analyze_batch(&[clearance, worked_example(), weak, overflow]);

        assert_eq!(batch.filtered, 1);
        assert_eq!(batch.truncated, 1);
        assert_eq!(batch.stats.total_analyzed, 2);
        assert_eq!(batch.stats.approved, 1);
        assert_eq!(batch.stats.rejected, 1);
        assert_eq!(batch.stats.hot_trends, 1);
        assert_eq!(batch.stats.average_score, 89);
        assert_eq!(batch.stats.total_profit_potential, 500.0);
    }
}
