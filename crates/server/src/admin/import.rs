use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use dropshop_core::domain::analysis::AnalysisLogEntry;
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::notification::Notification;
use dropshop_core::errors::ApplicationError;
use dropshop_core::intelligence::{ProductAnalyzer, SelectionCriteria};
use dropshop_db::{ImportError, ImportPipeline, ImportReport};
use dropshop_suppliers::{search_or_empty, SearchQuery, SupplierError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{application_failure, bad_request, repository_failure, ApiFailure, ApiResult};
use crate::state::AppState;

const DEFAULT_ANALYSES_LIMIT: u32 = 50;
const MAX_ANALYSES_LIMIT: u32 = 500;

/// Per-run adjustments on top of the configured selection criteria.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CriteriaOverrides {
    pub min_rating: Option<f64>,
    pub min_profit_margin: Option<f64>,
    pub min_orders: Option<u32>,
    pub min_review_count: Option<u32>,
    pub max_shipping_cost: Option<f64>,
    pub sentiment_threshold: Option<f64>,
    pub exclude_categories: Option<Vec<String>>,
    pub required_keywords: Option<Vec<String>>,
    pub banned_keywords: Option<Vec<String>>,
}

impl CriteriaOverrides {
    pub fn apply(self, mut criteria: SelectionCriteria) -> SelectionCriteria {
        if let Some(value) = self.min_rating {
            criteria.min_rating = value;
        }
        if let Some(value) = self.min_profit_margin {
            criteria.min_profit_margin = value;
        }
        if let Some(value) = self.min_orders {
            criteria.min_orders = value;
        }
        if let Some(value) = self.min_review_count {
            criteria.min_review_count = value;
        }
        if let Some(value) = self.max_shipping_cost {
            criteria.max_shipping_cost = value;
        }
        if let Some(value) = self.sentiment_threshold {
            criteria.sentiment_threshold = value;
        }
        if let Some(value) = self.exclude_categories {
            criteria.exclude_categories = value;
        }
        if let Some(value) = self.required_keywords {
            criteria.required_keywords = value;
        }
        if let Some(value) = self.banned_keywords {
            criteria.banned_keywords = value;
        }
        criteria
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub supplier: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub max_products: Option<usize>,
    #[serde(default)]
    pub criteria: Option<CriteriaOverrides>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub report: ImportReport,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnalysesParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AnalysesResponse {
    pub success: bool,
    pub analyses: Vec<AnalysisLogEntry>,
}

fn supplier_failure(error: SupplierError) -> ApiFailure {
    match error {
        SupplierError::NotConfigured(_) => {
            application_failure(ApplicationError::Configuration(error.to_string()))
        }
        other => application_failure(ApplicationError::Integration(other.to_string())),
    }
}

fn import_failure(error: ImportError) -> ApiFailure {
    application_failure(ApplicationError::Persistence(error.to_string()))
}

pub async fn run_import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<ImportResponse> {
    let supplier = SupplierKind::parse(&request.supplier)
        .filter(|kind| *kind != SupplierKind::Manual)
        .ok_or_else(|| bad_request(format!("unknown supplier `{}`", request.supplier)))?;

    let query = SearchQuery::new(request.keywords, state.config.suppliers.page_size);
    if query.keyword().is_empty() {
        return Err(bad_request("at least one keyword is required"));
    }

    let mut criteria = request.criteria.unwrap_or_default().apply(state.config.scoring.clone());
    if let Some(max_products) = request.max_products {
        criteria.max_products_per_run = max_products;
    }
    criteria.validate().map_err(bad_request)?;

    let client = state.suppliers.client(supplier).map_err(supplier_failure)?;
    let candidates = search_or_empty(client.as_ref(), &query).await;

    let analyzer = ProductAnalyzer::new(criteria);
    let pipeline =
        ImportPipeline::new(state.products.as_ref(), state.analysis_log.as_ref(), &analyzer);
    let report = pipeline.run(supplier, &candidates, Utc::now()).await.map_err(import_failure)?;

    info!(
        event_name = "admin.import.finished",
        run_id = %report.run_id,
        supplier = supplier.as_str(),
        keyword = %query.keyword(),
        imported = report.imported,
        analyzed = report.analyzed,
        "supplier import finished"
    );
    state
        .notify(Notification::import_finished(
            &report.run_id,
            supplier.as_str(),
            report.imported,
            report.analyzed,
        ))
        .await;

    Ok(Json(ImportResponse { success: true, report }))
}

pub async fn list_analyses(
    State(state): State<AppState>,
    Query(params): Query<AnalysesParams>,
) -> ApiResult<AnalysesResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_ANALYSES_LIMIT).clamp(1, MAX_ANALYSES_LIMIT);
    let analyses = state.analysis_log.recent(limit).await.map_err(repository_failure)?;
    Ok(Json(AnalysesResponse { success: true, analyses }))
}
