use dropshop_core::config::{AppConfig, LoadOptions};
use dropshop_db::connect_with_config;
use dropshop_suppliers::SupplierRegistry;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_DATABASE, EXIT_SUPPLIER};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// Error class and exit code of the first hard failure; warnings do not fail the run.
    fn failure(&self) -> Option<(&'static str, u8)> {
        let failed = |name: &str| {
            self.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
        };
        if failed("config_validation") {
            Some(("config_validation", EXIT_CONFIG))
        } else if failed("database_connectivity") {
            Some(("db_connectivity", EXIT_DATABASE))
        } else if failed("supplier_credentials") {
            Some(("supplier", EXIT_SUPPLIER))
        } else {
            None
        }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let failure = report.failure();

    if json_output {
        return match failure {
            Some((error_class, exit_code)) => CommandResult::failure_with_data(
                "doctor",
                error_class,
                report.summary.clone(),
                exit_code,
                &report,
            ),
            None => CommandResult::success_with_data("doctor", report.summary.clone(), &report),
        };
    }

    let exit_code = failure.map_or(0, |(_, exit_code)| exit_code);
    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database_connectivity(&config));
            checks.push(check_suppliers(&config));
            checks.push(check_payments(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_connectivity", "supplier_credentials", "payment_gateway"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let healthy = checks.iter().all(|check| matches!(check.status, CheckStatus::Pass | CheckStatus::Warn));
    let overall_status = if healthy { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if healthy {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_suppliers(config: &AppConfig) -> DoctorCheck {
    match SupplierRegistry::from_config(&config.suppliers) {
        Ok(registry) => {
            let configured: Vec<&str> = registry.configured().iter().map(|kind| kind.as_str()).collect();
            if configured.is_empty() {
                DoctorCheck {
                    name: "supplier_credentials",
                    status: CheckStatus::Warn,
                    details: "no supplier credentials configured; imports are disabled".to_string(),
                }
            } else {
                DoctorCheck {
                    name: "supplier_credentials",
                    status: CheckStatus::Pass,
                    details: format!("configured: {}", configured.join(", ")),
                }
            }
        }
        Err(error) => DoctorCheck {
            name: "supplier_credentials",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_payments(config: &AppConfig) -> DoctorCheck {
    if config.payments.secret_key.is_some() {
        DoctorCheck {
            name: "payment_gateway",
            status: CheckStatus::Pass,
            details: format!("payment key present, currency `{}`", config.payments.currency),
        }
    } else {
        DoctorCheck {
            name: "payment_gateway",
            status: CheckStatus::Warn,
            details: "payments.secret_key unset; checkout will return 503".to_string(),
        }
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|error| format!("database probe failed: {error}"))?;
        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}
