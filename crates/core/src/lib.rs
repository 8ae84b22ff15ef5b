pub mod config;
pub mod domain;
pub mod errors;
pub mod intelligence;
pub mod session;
pub mod signing;

pub use chrono;
pub use rust_decimal;

pub use domain::analysis::AnalysisLogEntry;
pub use domain::candidate::{CandidateProduct, SupplierKind};
pub use domain::cart::{Cart, CartError, CartLine};
pub use domain::customer::{Customer, CustomerId};
pub use domain::notification::{
    Notification, NotificationId, NotificationKind, NotificationPriority,
};
pub use domain::order::{Order, OrderId, OrderItem, OrderStatus, PaymentStatus};
pub use domain::product::{ProductDraft, ProductId, StoredProduct};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use intelligence::{
    BatchAnalysis, Decision, DemandLevel, ProductAnalysis, ProductAnalyzer, RunStats,
    ScoredProduct, ScoringError, ScoringModel, SelectionCriteria,
};
pub use session::{AdminSession, SessionError, SessionPolicy};
