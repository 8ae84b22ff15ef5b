//! Import pipeline: scores supplier candidates and inserts approved ones into
//! the catalog.
//!
//! Runs are sequential and safe to repeat. A candidate already analyzed on the
//! same UTC day is skipped, and catalog inserts are insert-or-ignore on
//! `(source, external_id)`, so a second run never duplicates a product.
//!
//! Only scored candidates get an analysis-log row. Anything reported without
//! one stays eligible for the next run the same day.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use dropshop_core::domain::analysis::AnalysisLogEntry;
use dropshop_core::domain::candidate::{CandidateProduct, SupplierKind};
use dropshop_core::domain::product::StoredProduct;
use dropshop_core::intelligence::{Decision, ProductAnalysis, ProductAnalyzer, RunStats};

use crate::repositories::{AnalysisLogRepository, ProductRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("analysis log unavailable: {0}")]
    AnalysisLog(#[source] RepositoryError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Imported,
    Duplicate,
    Rejected,
    Failed,
    SkippedToday,
    Filtered,
    /// Admitted but beyond `max_products_per_run`.
    Truncated,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub external_id: String,
    pub name: String,
    pub decision: Option<Decision>,
    pub ai_score: Option<u8>,
    pub status: OutcomeStatus,
    pub product_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub run_id: String,
    pub supplier: Option<SupplierKind>,
    pub analyzed: usize,
    pub approved: usize,
    pub rejected: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub skipped_today: usize,
    pub filtered: usize,
    pub truncated: usize,
    pub failed: usize,
    pub hot_trends: usize,
    pub average_score: u32,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    fn record(&mut self, candidate: &CandidateProduct, status: OutcomeStatus) {
        self.outcomes.push(ImportOutcome {
            external_id: candidate.external_id.clone(),
            name: candidate.name.clone(),
            decision: None,
            ai_score: None,
            status,
            product_id: None,
        });
    }
}

pub struct ImportPipeline<'a> {
    products: &'a dyn ProductRepository,
    analysis_log: &'a dyn AnalysisLogRepository,
    analyzer: &'a ProductAnalyzer,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(
        products: &'a dyn ProductRepository,
        analysis_log: &'a dyn AnalysisLogRepository,
        analyzer: &'a ProductAnalyzer,
    ) -> Self {
        Self { products, analysis_log, analyzer }
    }

    pub async fn run(
        &self,
        supplier: SupplierKind,
        candidates: &[CandidateProduct],
        now: DateTime<Utc>,
    ) -> Result<ImportReport, ImportError> {
        let run_id = Uuid::new_v4().to_string();
        let mut report =
            ImportReport { run_id: run_id.clone(), supplier: Some(supplier), ..ImportReport::default() };

        info!(
            event_name = "import.run.start",
            run_id = %run_id,
            supplier = supplier.as_str(),
            candidates = candidates.len(),
            "import run started"
        );

        let today = now.date_naive();
        let mut fresh = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let seen = self
                .analysis_log
                .analyzed_on(candidate.supplier, &candidate.external_id, today)
                .await
                .map_err(ImportError::AnalysisLog)?;
            if seen {
                report.skipped_today += 1;
                report.record(candidate, OutcomeStatus::SkippedToday);
            } else {
                fresh.push(candidate.clone());
            }
        }

        for candidate in fresh.iter().filter(|candidate| !self.analyzer.criteria().admits(candidate)) {
            report.record(candidate, OutcomeStatus::Filtered);
        }
        let (selected, filtered, truncated) = self.analyzer.select(&fresh);
        report.filtered = filtered;
        report.truncated = truncated;
        let capped = fresh
            .iter()
            .filter(|candidate| self.analyzer.criteria().admits(candidate))
            .skip(selected.len());
        for candidate in capped {
            report.record(candidate, OutcomeStatus::Truncated);
        }

        let mut analyses: Vec<ProductAnalysis> = Vec::with_capacity(selected.len());
        for candidate in selected {
            let analysis = match self.analyzer.analyze(candidate) {
                Ok(analysis) => analysis,
                Err(error) => {
                    warn!(
                        event_name = "import.candidate.invalid",
                        run_id = %run_id,
                        external_id = %candidate.external_id,
                        error = %error,
                        "candidate rejected before scoring"
                    );
                    report.failed += 1;
                    report.record(candidate, OutcomeStatus::Failed);
                    continue;
                }
            };

            let mut outcome = ImportOutcome {
                external_id: candidate.external_id.clone(),
                name: candidate.name.clone(),
                decision: Some(analysis.decision),
                ai_score: Some(analysis.ai_score()),
                status: OutcomeStatus::Rejected,
                product_id: None,
            };

            let entry = AnalysisLogEntry::from_analysis(&run_id, &analysis, now);
            if let Err(error) = self.analysis_log.append(entry).await {
                warn!(
                    event_name = "import.analysis_log.append_failed",
                    run_id = %run_id,
                    external_id = %candidate.external_id,
                    error = %error,
                    "analysis not recorded, candidate skipped"
                );
                report.failed += 1;
                outcome.status = OutcomeStatus::Failed;
                report.outcomes.push(outcome);
                continue;
            }

            if analysis.is_approved() {
                let multiplier = self.analyzer.criteria().model.suggested_price_multiplier;
                let product = StoredProduct::from_scored(&analysis.product, multiplier, now);
                let product_id = product.id.0.clone();
                match self.products.insert_if_absent(product).await {
                    Ok(true) => {
                        report.imported += 1;
                        outcome.status = OutcomeStatus::Imported;
                        outcome.product_id = Some(product_id);
                    }
                    Ok(false) => {
                        report.duplicates += 1;
                        outcome.status = OutcomeStatus::Duplicate;
                    }
                    Err(error) => {
                        warn!(
                            event_name = "import.product.insert_failed",
                            run_id = %run_id,
                            external_id = %candidate.external_id,
                            error = %error,
                            "failed to insert approved product"
                        );
                        report.failed += 1;
                        outcome.status = OutcomeStatus::Failed;
                    }
                }
            }

            report.outcomes.push(outcome);
            analyses.push(analysis);
        }

        let stats = RunStats::from_analyses(&analyses);
        report.analyzed = stats.total_analyzed;
        report.approved = stats.approved;
        report.rejected = stats.rejected;
        report.hot_trends = stats.hot_trends;
        report.average_score = stats.average_score;

        info!(
            event_name = "import.run.finished",
            run_id = %run_id,
            supplier = supplier.as_str(),
            analyzed = report.analyzed,
            approved = report.approved,
            imported = report.imported,
            duplicates = report.duplicates,
            skipped_today = report.skipped_today,
            truncated = report.truncated,
            failed = report.failed,
            "import run finished"
        );

        Ok(report)
    }
}
