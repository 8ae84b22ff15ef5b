pub mod connection;
pub mod import;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use import::{ImportError, ImportOutcome, ImportPipeline, ImportReport, OutcomeStatus};
