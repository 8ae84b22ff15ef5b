use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dropshop_core::config::AppConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

struct Field {
    key: &'static str,
    env_keys: &'static [&'static str],
    read: fn(&AppConfig) -> String,
}

const FIELDS: &[Field] = &[
    Field { key: "database.url", env_keys: &["DROPSHOP_DATABASE_URL"], read: |c| c.database.url.clone() },
    Field {
        key: "database.max_connections",
        env_keys: &["DROPSHOP_DATABASE_MAX_CONNECTIONS"],
        read: |c| c.database.max_connections.to_string(),
    },
    Field {
        key: "database.timeout_secs",
        env_keys: &["DROPSHOP_DATABASE_TIMEOUT_SECS"],
        read: |c| c.database.timeout_secs.to_string(),
    },
    Field {
        key: "server.bind_address",
        env_keys: &["DROPSHOP_SERVER_BIND_ADDRESS"],
        read: |c| c.server.bind_address.clone(),
    },
    Field { key: "server.port", env_keys: &["DROPSHOP_SERVER_PORT"], read: |c| c.server.port.to_string() },
    Field {
        key: "logging.level",
        env_keys: &["DROPSHOP_LOGGING_LEVEL", "DROPSHOP_LOG_LEVEL"],
        read: |c| c.logging.level.clone(),
    },
    Field {
        key: "logging.format",
        env_keys: &["DROPSHOP_LOGGING_FORMAT", "DROPSHOP_LOG_FORMAT"],
        read: |c| format!("{:?}", c.logging.format).to_ascii_lowercase(),
    },
    Field { key: "admin.username", env_keys: &["DROPSHOP_ADMIN_USERNAME"], read: |c| c.admin.username.clone() },
    Field {
        key: "admin.password",
        env_keys: &["DROPSHOP_ADMIN_PASSWORD"],
        read: |c| redact(Some(&c.admin.password)),
    },
    Field {
        key: "suppliers.cj.app_key",
        env_keys: &["DROPSHOP_CJ_APP_KEY"],
        read: |c| c.suppliers.cj.app_key.clone().unwrap_or_else(|| "<unset>".to_string()),
    },
    Field {
        key: "suppliers.cj.secret_key",
        env_keys: &["DROPSHOP_CJ_SECRET_KEY"],
        read: |c| redact(c.suppliers.cj.secret_key.as_ref()),
    },
    Field {
        key: "suppliers.cj.webhook_secret",
        env_keys: &["DROPSHOP_CJ_WEBHOOK_SECRET"],
        read: |c| redact(c.suppliers.cj.webhook_secret.as_ref()),
    },
    Field {
        key: "suppliers.zendrop.api_key",
        env_keys: &["DROPSHOP_ZENDROP_API_KEY"],
        read: |c| redact(c.suppliers.zendrop.api_key.as_ref()),
    },
    Field {
        key: "suppliers.zendrop.webhook_secret",
        env_keys: &["DROPSHOP_ZENDROP_WEBHOOK_SECRET"],
        read: |c| redact(c.suppliers.zendrop.webhook_secret.as_ref()),
    },
    Field {
        key: "suppliers.appscenic.api_key",
        env_keys: &["DROPSHOP_APPSCENIC_API_KEY"],
        read: |c| redact(c.suppliers.appscenic.api_key.as_ref()),
    },
    Field {
        key: "payments.secret_key",
        env_keys: &["DROPSHOP_PAYMENTS_SECRET_KEY"],
        read: |c| redact(c.payments.secret_key.as_ref()),
    },
    Field { key: "payments.currency", env_keys: &["DROPSHOP_PAYMENTS_CURRENCY"], read: |c| c.payments.currency.clone() },
    Field {
        key: "scoring.min_rating",
        env_keys: &["DROPSHOP_SCORING_MIN_RATING"],
        read: |c| c.scoring.min_rating.to_string(),
    },
    Field {
        key: "scoring.min_profit_margin",
        env_keys: &["DROPSHOP_SCORING_MIN_PROFIT_MARGIN"],
        read: |c| c.scoring.min_profit_margin.to_string(),
    },
    Field {
        key: "scoring.min_orders",
        env_keys: &["DROPSHOP_SCORING_MIN_ORDERS"],
        read: |c| c.scoring.min_orders.to_string(),
    },
    Field {
        key: "scoring.max_products_per_run",
        env_keys: &["DROPSHOP_SCORING_MAX_PRODUCTS_PER_RUN"],
        read: |c| c.scoring.max_products_per_run.to_string(),
    },
];

/// Effective configuration with per-key source attribution
/// (precedence: env > file > default). Secrets are never printed.
pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let file_path = detect_config_path();
    let file_doc = file_path.as_deref().and_then(load_config_file_doc);
    let entries: Vec<ConfigEntry> = FIELDS
        .iter()
        .map(|field| ConfigEntry {
            key: field.key,
            value: (field.read)(&config),
            source: field_source(field, file_doc.as_ref(), file_path.as_deref()),
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        entries,
    )
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("dropshop.toml"), PathBuf::from("config/dropshop.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

fn field_source(field: &Field, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, field.key)) {
        let file_path = file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact(secret: Option<&SecretString>) -> String {
    match secret.map(|value| value.expose_secret().trim().is_empty()) {
        None | Some(true) => "<unset>".to_string(),
        Some(false) => "<redacted>".to_string(),
    }
}
