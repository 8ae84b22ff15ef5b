use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use dropshop_core::domain::analysis::AnalysisLogEntry;
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::cart::Cart;
use dropshop_core::domain::customer::{Customer, CustomerId};
use dropshop_core::domain::notification::{Notification, NotificationId};
use dropshop_core::domain::order::{Order, OrderId, OrderStatus};
use dropshop_core::domain::product::{ProductId, StoredProduct};

pub mod analysis_log;
pub mod cart;
pub mod customer;
pub mod memory;
pub mod notification;
pub mod order;
pub mod product;

pub use analysis_log::SqlAnalysisLogRepository;
pub use cart::SqlCartRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{
    InMemoryAnalysisLogRepository, InMemoryNotificationRepository, InMemoryProductRepository,
};
pub use notification::SqlNotificationRepository;
pub use order::SqlOrderRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|error| RepositoryError::Decode(format!("invalid decimal `{raw}`: {error}")))
}

/// Filters for catalog listings. `limit` of zero means no rows.
#[derive(Clone, Debug, Default)]
pub struct ProductQuery {
    pub active_only: bool,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub product_count: i64,
}

#[derive(Clone, Debug, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub limit: u32,
    pub offset: u32,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<StoredProduct>, RepositoryError>;

    async fn find_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
    ) -> Result<Option<StoredProduct>, RepositoryError>;

    async fn save(&self, product: StoredProduct) -> Result<(), RepositoryError>;

    /// Inserts unless a row with the same id or `(source, external_id)` exists.
    /// Returns whether a row was written.
    async fn insert_if_absent(&self, product: StoredProduct) -> Result<bool, RepositoryError>;

    async fn list(&self, query: &ProductQuery) -> Result<Vec<StoredProduct>, RepositoryError>;

    async fn count(&self, query: &ProductQuery) -> Result<i64, RepositoryError>;

    async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError>;

    async fn set_stock_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
        stock_quantity: i64,
    ) -> Result<Option<StoredProduct>, RepositoryError>;
}

#[async_trait]
pub trait AnalysisLogRepository: Send + Sync {
    async fn append(&self, entry: AnalysisLogEntry) -> Result<(), RepositoryError>;

    /// Whether the candidate already has a row analyzed on `day` (UTC).
    async fn analyzed_on(
        &self,
        supplier: SupplierKind,
        external_id: &str,
        day: NaiveDate,
    ) -> Result<bool, RepositoryError>;

    async fn recent(&self, limit: u32) -> Result<Vec<AnalysisLogEntry>, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Writes the order and its items atomically.
    async fn create(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_supplier_order_id(
        &self,
        supplier_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, RepositoryError>;

    async fn count(&self, status: Option<OrderStatus>) -> Result<i64, RepositoryError>;

    /// Persists status, payment and fulfillment fields. Items are immutable.
    async fn update(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn paid_revenue(&self) -> Result<Decimal, RepositoryError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError>;

    /// Returns the stored customer and whether it was newly created.
    async fn upsert_by_email(&self, customer: Customer)
        -> Result<(Customer, bool), RepositoryError>;

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Customer>, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), RepositoryError>;

    async fn list(
        &self,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError>;

    async fn mark_read(&self, id: &NotificationId) -> Result<bool, RepositoryError>;

    async fn mark_all_read(&self) -> Result<u64, RepositoryError>;

    async fn unread_count(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Loads the session's lines joined with current product name and price.
    /// Lines whose product is inactive are left out.
    async fn load(&self, session_id: &str) -> Result<Cart, RepositoryError>;

    /// Replaces every stored line for the cart's session.
    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError>;

    async fn clear(&self, session_id: &str) -> Result<(), RepositoryError>;
}
