//! Outbound supplier catalog clients.
//!
//! Each client turns a keyword search into [`CandidateProduct`]s. Failures are
//! returned as [`SupplierError`]; callers that feed the import pipeline use
//! [`search_or_empty`] to log and continue with no candidates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use dropshop_core::config::SuppliersConfig;
use dropshop_core::domain::candidate::{CandidateProduct, SupplierKind};

pub mod appscenic;
pub mod cj;
mod fields;
pub mod zendrop;

pub use appscenic::AppScenicClient;
pub use cj::CjClient;
pub use zendrop::ZendropClient;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("{0} is not configured")]
    NotConfigured(SupplierKind),
    #[error("{supplier} request failed: {source}")]
    Http {
        supplier: SupplierKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{supplier} returned HTTP {status}")]
    Status { supplier: SupplierKind, status: u16 },
    #[error("{supplier} rejected the request: {message}")]
    Api { supplier: SupplierKind, message: String },
    #[error("{supplier} response could not be decoded: {message}")]
    Decode { supplier: SupplierKind, message: String },
}

impl SupplierError {
    pub fn supplier(&self) -> SupplierKind {
        match self {
            Self::NotConfigured(supplier) => *supplier,
            Self::Http { supplier, .. }
            | Self::Status { supplier, .. }
            | Self::Api { supplier, .. }
            | Self::Decode { supplier, .. } => *supplier,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(keywords: Vec<String>, limit: u32) -> Self {
        Self { keywords, limit: limit.max(1) }
    }

    /// Keywords joined with single spaces, blanks dropped.
    pub fn keyword(&self) -> String {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait SupplierClient: Send + Sync {
    fn kind(&self) -> SupplierKind;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateProduct>, SupplierError>;
}

/// Runs a search and degrades any failure to an empty result.
pub async fn search_or_empty(
    client: &dyn SupplierClient,
    query: &SearchQuery,
) -> Vec<CandidateProduct> {
    match client.search(query).await {
        Ok(candidates) => candidates,
        Err(error) => {
            warn!(
                event_name = "supplier.search.failed",
                supplier = client.kind().as_str(),
                error = %error,
                "supplier search failed, continuing with no candidates"
            );
            Vec::new()
        }
    }
}

/// Configured supplier clients sharing one HTTP connection pool.
#[derive(Clone, Default)]
pub struct SupplierRegistry {
    cj: Option<Arc<dyn SupplierClient>>,
    zendrop: Option<Arc<dyn SupplierClient>>,
    appscenic: Option<Arc<dyn SupplierClient>>,
}

impl SupplierRegistry {
    pub fn from_config(config: &SuppliersConfig) -> Result<Self, SupplierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| SupplierError::Http { supplier: SupplierKind::Manual, source })?;

        let mut registry = Self::empty();
        if let Some(client) = CjClient::from_config(http.clone(), &config.cj) {
            registry = registry.with_client(Arc::new(client));
        }
        if let Some(client) = ZendropClient::from_config(http.clone(), &config.zendrop) {
            registry = registry.with_client(Arc::new(client));
        }
        if let Some(client) = AppScenicClient::from_config(http, &config.appscenic) {
            registry = registry.with_client(Arc::new(client));
        }
        Ok(registry)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `client` under its own kind, replacing any previous one.
    /// Manual clients are ignored.
    pub fn with_client(mut self, client: Arc<dyn SupplierClient>) -> Self {
        match client.kind() {
            SupplierKind::Cj => self.cj = Some(client),
            SupplierKind::Zendrop => self.zendrop = Some(client),
            SupplierKind::Appscenic => self.appscenic = Some(client),
            SupplierKind::Manual => {}
        }
        self
    }

    pub fn client(&self, kind: SupplierKind) -> Result<Arc<dyn SupplierClient>, SupplierError> {
        let client = match kind {
            SupplierKind::Cj => self.cj.clone(),
            SupplierKind::Zendrop => self.zendrop.clone(),
            SupplierKind::Appscenic => self.appscenic.clone(),
            SupplierKind::Manual => None,
        };
        client.ok_or(SupplierError::NotConfigured(kind))
    }

    pub fn configured(&self) -> Vec<SupplierKind> {
        [
            (SupplierKind::Cj, self.cj.is_some()),
            (SupplierKind::Zendrop, self.zendrop.is_some()),
            (SupplierKind::Appscenic, self.appscenic.is_some()),
        ]
        .into_iter()
        .filter_map(|(kind, present)| present.then_some(kind))
        .collect()
    }
}

pub(crate) async fn read_json(
    supplier: SupplierKind,
    response: reqwest::Response,
) -> Result<serde_json::Value, SupplierError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SupplierError::Status { supplier, status: status.as_u16() });
    }
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|error| SupplierError::Decode { supplier, message: error.to_string() })
}
