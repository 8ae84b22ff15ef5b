use chrono::Utc;
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::notification::Notification;
use dropshop_core::intelligence::ProductAnalyzer;
use dropshop_db::repositories::{
    NotificationRepository, SqlAnalysisLogRepository, SqlNotificationRepository,
    SqlProductRepository,
};
use dropshop_db::{connect_with_config, migrations, ImportPipeline};
use dropshop_suppliers::{search_or_empty, SearchQuery, SupplierRegistry};

use crate::commands::{
    load_config, runtime, CommandResult, EXIT_DATABASE, EXIT_INPUT, EXIT_MIGRATION, EXIT_SUPPLIER,
};

pub struct ImportArgs {
    pub supplier: String,
    pub keywords: Vec<String>,
    pub dry_run: bool,
}

/// Searches one supplier and runs the results through the import pipeline.
/// With `dry_run` the candidates are only scored.
pub fn run(args: ImportArgs) -> CommandResult {
    let supplier = match SupplierKind::parse(&args.supplier).filter(|kind| *kind != SupplierKind::Manual) {
        Some(supplier) => supplier,
        None => {
            return CommandResult::failure(
                "import",
                "input",
                format!("unknown supplier `{}` (expected cj, zendrop or appscenic)", args.supplier),
                EXIT_INPUT,
            );
        }
    };

    let config = match load_config("import") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let query = SearchQuery::new(args.keywords, config.suppliers.page_size);
    if query.keyword().is_empty() {
        return CommandResult::failure("import", "input", "at least one --keyword is required", EXIT_INPUT);
    }

    let client = match SupplierRegistry::from_config(&config.suppliers).and_then(|registry| registry.client(supplier)) {
        Ok(client) => client,
        Err(error) => return CommandResult::failure("import", "supplier", error.to_string(), EXIT_SUPPLIER),
    };
    let runtime = match runtime("import") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let analyzer = ProductAnalyzer::new(config.scoring.clone());
    runtime.block_on(async {
        let candidates = search_or_empty(client.as_ref(), &query).await;

        if args.dry_run {
            let batch = analyzer.analyze_batch(&candidates);
            let message = format!(
                "dry run: {} candidates from {}, {} would be approved",
                candidates.len(),
                supplier.as_str(),
                batch.stats.approved
            );
            return CommandResult::success_with_data("import", message, &batch);
        }

        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure("import", "db_connectivity", error.to_string(), EXIT_DATABASE)
            }
        };
        if let Err(error) = migrations::run_pending(&pool).await {
            return CommandResult::failure("import", "migration", error.to_string(), EXIT_MIGRATION);
        }

        let products = SqlProductRepository::new(pool.clone());
        let analysis_log = SqlAnalysisLogRepository::new(pool.clone());
        let pipeline = ImportPipeline::new(&products, &analysis_log, &analyzer);
        let result = match pipeline.run(supplier, &candidates, Utc::now()).await {
            Ok(report) => {
                let notifications = SqlNotificationRepository::new(pool.clone());
                let notice = Notification::import_finished(
                    &report.run_id,
                    supplier.as_str(),
                    report.imported,
                    report.analyzed,
                );
                let mut message = format!(
                    "imported {} of {} analyzed candidates from {}",
                    report.imported,
                    report.analyzed,
                    supplier.as_str()
                );
                if let Err(error) = notifications.create(&notice).await {
                    message.push_str(&format!(" (notification not stored: {error})"));
                }
                CommandResult::success_with_data("import", message, &report)
            }
            Err(error) => CommandResult::failure("import", "persistence", error.to_string(), EXIT_DATABASE),
        };
        pool.close().await;
        result
    })
}
