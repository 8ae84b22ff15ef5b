use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::intelligence::SelectionCriteria;
use crate::session::SessionPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
    pub suppliers: SuppliersConfig,
    pub payments: PaymentsConfig,
    pub scoring: SelectionCriteria,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    pub password: SecretString,
    pub session_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SuppliersConfig {
    pub timeout_secs: u64,
    pub page_size: u32,
    pub cj: CjConfig,
    pub zendrop: ZendropConfig,
    pub appscenic: AppScenicConfig,
}

#[derive(Clone, Debug)]
pub struct CjConfig {
    pub base_url: String,
    pub app_key: Option<String>,
    pub secret_key: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ZendropConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub webhook_secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct AppScenicConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    pub base_url: String,
    pub secret_key: Option<SecretString>,
    pub currency: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://dropshop.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            admin: AdminConfig {
                username: "admin".to_string(),
                password: String::new().into(),
                session_timeout_secs: 3600,
                idle_timeout_secs: 1800,
            },
            suppliers: SuppliersConfig {
                timeout_secs: 30,
                page_size: 20,
                cj: CjConfig {
                    base_url: "https://api.cjdropshipping.com".to_string(),
                    app_key: None,
                    secret_key: None,
                    webhook_secret: None,
                },
                zendrop: ZendropConfig {
                    base_url: "https://api.zendrop.com/v2".to_string(),
                    api_key: None,
                    webhook_secret: None,
                },
                appscenic: AppScenicConfig {
                    base_url: "https://api.appscenic.com/v1".to_string(),
                    api_key: None,
                },
            },
            payments: PaymentsConfig {
                base_url: "https://api.stripe.com".to_string(),
                secret_key: None,
                currency: "usd".to_string(),
            },
            scoring: SelectionCriteria::default(),
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AdminConfig {
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            session_timeout_secs: self.session_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

impl CjConfig {
    pub fn is_configured(&self) -> bool {
        self.app_key.is_some() && self.secret_key.is_some()
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dropshop.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(username) = admin.username {
                self.admin.username = username;
            }
            if let Some(password) = admin.password {
                self.admin.password = secret_value(password);
            }
            if let Some(session_timeout_secs) = admin.session_timeout_secs {
                self.admin.session_timeout_secs = session_timeout_secs;
            }
            if let Some(idle_timeout_secs) = admin.idle_timeout_secs {
                self.admin.idle_timeout_secs = idle_timeout_secs;
            }
        }

        if let Some(suppliers) = patch.suppliers {
            if let Some(timeout_secs) = suppliers.timeout_secs {
                self.suppliers.timeout_secs = timeout_secs;
            }
            if let Some(page_size) = suppliers.page_size {
                self.suppliers.page_size = page_size;
            }
            if let Some(cj) = suppliers.cj {
                if let Some(base_url) = cj.base_url {
                    self.suppliers.cj.base_url = base_url;
                }
                if let Some(app_key) = cj.app_key {
                    self.suppliers.cj.app_key = Some(app_key);
                }
                if let Some(secret_key) = cj.secret_key {
                    self.suppliers.cj.secret_key = Some(secret_value(secret_key));
                }
                if let Some(webhook_secret) = cj.webhook_secret {
                    self.suppliers.cj.webhook_secret = Some(secret_value(webhook_secret));
                }
            }
            if let Some(zendrop) = suppliers.zendrop {
                if let Some(base_url) = zendrop.base_url {
                    self.suppliers.zendrop.base_url = base_url;
                }
                if let Some(api_key) = zendrop.api_key {
                    self.suppliers.zendrop.api_key = Some(secret_value(api_key));
                }
                if let Some(webhook_secret) = zendrop.webhook_secret {
                    self.suppliers.zendrop.webhook_secret = Some(secret_value(webhook_secret));
                }
            }
            if let Some(appscenic) = suppliers.appscenic {
                if let Some(base_url) = appscenic.base_url {
                    self.suppliers.appscenic.base_url = base_url;
                }
                if let Some(api_key) = appscenic.api_key {
                    self.suppliers.appscenic.api_key = Some(secret_value(api_key));
                }
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(base_url) = payments.base_url {
                self.payments.base_url = base_url;
            }
            if let Some(secret_key) = payments.secret_key {
                self.payments.secret_key = Some(secret_value(secret_key));
            }
            if let Some(currency) = payments.currency {
                self.payments.currency = currency;
            }
        }

        if let Some(scoring) = patch.scoring {
            self.scoring = scoring;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DROPSHOP_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DROPSHOP_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("DROPSHOP_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DROPSHOP_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DROPSHOP_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DROPSHOP_SERVER_PORT") {
            self.server.port = parse_u16("DROPSHOP_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DROPSHOP_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("DROPSHOP_LOGGING_LEVEL").or_else(|| read_env("DROPSHOP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DROPSHOP_LOGGING_FORMAT").or_else(|| read_env("DROPSHOP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("DROPSHOP_ADMIN_USERNAME") {
            self.admin.username = value;
        }
        if let Some(value) = read_env("DROPSHOP_ADMIN_PASSWORD") {
            self.admin.password = secret_value(value);
        }
        if let Some(value) = read_env("DROPSHOP_ADMIN_SESSION_TIMEOUT_SECS") {
            self.admin.session_timeout_secs =
                parse_u64("DROPSHOP_ADMIN_SESSION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_ADMIN_IDLE_TIMEOUT_SECS") {
            self.admin.idle_timeout_secs = parse_u64("DROPSHOP_ADMIN_IDLE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DROPSHOP_SUPPLIERS_TIMEOUT_SECS") {
            self.suppliers.timeout_secs = parse_u64("DROPSHOP_SUPPLIERS_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_SUPPLIERS_PAGE_SIZE") {
            self.suppliers.page_size = parse_u32("DROPSHOP_SUPPLIERS_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_CJ_BASE_URL") {
            self.suppliers.cj.base_url = value;
        }
        if let Some(value) = read_env("DROPSHOP_CJ_APP_KEY") {
            self.suppliers.cj.app_key = Some(value);
        }
        if let Some(value) = read_env("DROPSHOP_CJ_SECRET_KEY") {
            self.suppliers.cj.secret_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DROPSHOP_CJ_WEBHOOK_SECRET") {
            self.suppliers.cj.webhook_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("DROPSHOP_ZENDROP_BASE_URL") {
            self.suppliers.zendrop.base_url = value;
        }
        if let Some(value) = read_env("DROPSHOP_ZENDROP_API_KEY") {
            self.suppliers.zendrop.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DROPSHOP_ZENDROP_WEBHOOK_SECRET") {
            self.suppliers.zendrop.webhook_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("DROPSHOP_APPSCENIC_BASE_URL") {
            self.suppliers.appscenic.base_url = value;
        }
        if let Some(value) = read_env("DROPSHOP_APPSCENIC_API_KEY") {
            self.suppliers.appscenic.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("DROPSHOP_PAYMENTS_BASE_URL") {
            self.payments.base_url = value;
        }
        if let Some(value) = read_env("DROPSHOP_PAYMENTS_SECRET_KEY") {
            self.payments.secret_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DROPSHOP_PAYMENTS_CURRENCY") {
            self.payments.currency = value;
        }

        if let Some(value) = read_env("DROPSHOP_SCORING_MIN_RATING") {
            self.scoring.min_rating = parse_f64("DROPSHOP_SCORING_MIN_RATING", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_SCORING_MIN_PROFIT_MARGIN") {
            self.scoring.min_profit_margin =
                parse_f64("DROPSHOP_SCORING_MIN_PROFIT_MARGIN", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_SCORING_MIN_ORDERS") {
            self.scoring.min_orders = parse_u32("DROPSHOP_SCORING_MIN_ORDERS", &value)?;
        }
        if let Some(value) = read_env("DROPSHOP_SCORING_MAX_PRODUCTS_PER_RUN") {
            self.scoring.max_products_per_run =
                parse_u32("DROPSHOP_SCORING_MAX_PRODUCTS_PER_RUN", &value)? as usize;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(admin_password) = overrides.admin_password {
            self.admin.password = secret_value(admin_password);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_admin(&self.admin)?;
        validate_suppliers(&self.suppliers)?;
        validate_payments(&self.payments)?;
        self.scoring
            .validate()
            .map_err(|message| ConfigError::Validation(format!("scoring: {message}")))?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dropshop.toml"), PathBuf::from("config/dropshop.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if admin.username.trim().is_empty() {
        return Err(ConfigError::Validation("admin.username must not be empty".to_string()));
    }

    let password = admin.password.expose_secret();
    if password.is_empty() {
        return Err(ConfigError::Validation(
            "admin.password is required. Set DROPSHOP_ADMIN_PASSWORD or `[admin] password` in dropshop.toml".to_string(),
        ));
    }
    if password.chars().count() < 8 {
        return Err(ConfigError::Validation(
            "admin.password must be at least 8 characters long".to_string(),
        ));
    }

    if admin.session_timeout_secs == 0 || admin.idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "admin.session_timeout_secs and admin.idle_timeout_secs must be greater than zero"
                .to_string(),
        ));
    }
    if admin.idle_timeout_secs > admin.session_timeout_secs {
        return Err(ConfigError::Validation(
            "admin.idle_timeout_secs cannot exceed admin.session_timeout_secs".to_string(),
        ));
    }

    Ok(())
}

fn validate_suppliers(suppliers: &SuppliersConfig) -> Result<(), ConfigError> {
    if suppliers.timeout_secs == 0 || suppliers.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "suppliers.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if suppliers.page_size == 0 || suppliers.page_size > 200 {
        return Err(ConfigError::Validation(
            "suppliers.page_size must be in range 1..=200".to_string(),
        ));
    }

    for (key, url) in [
        ("suppliers.cj.base_url", &suppliers.cj.base_url),
        ("suppliers.zendrop.base_url", &suppliers.zendrop.base_url),
        ("suppliers.appscenic.base_url", &suppliers.appscenic.base_url),
    ] {
        validate_http_url(key, url)?;
    }

    if suppliers.cj.app_key.is_some() != suppliers.cj.secret_key.is_some() {
        return Err(ConfigError::Validation(
            "suppliers.cj.app_key and suppliers.cj.secret_key must be configured together"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_payments(payments: &PaymentsConfig) -> Result<(), ConfigError> {
    validate_http_url("payments.base_url", &payments.base_url)?;

    let currency = payments.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(
            "payments.currency must be a three-letter ISO code such as `usd`".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    admin: Option<AdminPatch>,
    suppliers: Option<SuppliersPatch>,
    payments: Option<PaymentsPatch>,
    scoring: Option<SelectionCriteria>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    username: Option<String>,
    password: Option<String>,
    session_timeout_secs: Option<u64>,
    idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SuppliersPatch {
    timeout_secs: Option<u64>,
    page_size: Option<u32>,
    cj: Option<CjPatch>,
    zendrop: Option<ZendropPatch>,
    appscenic: Option<AppScenicPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CjPatch {
    base_url: Option<String>,
    app_key: Option<String>,
    secret_key: Option<String>,
    webhook_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ZendropPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    webhook_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AppScenicPatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    base_url: Option<String>,
    secret_key: Option<String>,
    currency: Option<String>,
}
