use std::sync::Arc;

use dropshop_core::config::AppConfig;
use dropshop_core::domain::notification::Notification;
use dropshop_db::repositories::{
    AnalysisLogRepository, CartRepository, CustomerRepository, NotificationRepository,
    OrderRepository, ProductRepository, SqlAnalysisLogRepository, SqlCartRepository,
    SqlCustomerRepository, SqlNotificationRepository, SqlOrderRepository, SqlProductRepository,
};
use dropshop_db::DbPool;
use dropshop_suppliers::SupplierRegistry;
use tera::Tera;
use tracing::warn;

use crate::payments::PaymentGateway;

/// Everything a handler can reach. Cloned per request; all fields are shared handles.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<AppConfig>,
    pub templates: Arc<Tera>,
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub analysis_log: Arc<dyn AnalysisLogRepository>,
    pub suppliers: SupplierRegistry,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db_pool: DbPool,
        templates: Arc<Tera>,
        suppliers: SupplierRegistry,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            products: Arc::new(SqlProductRepository::new(db_pool.clone())),
            orders: Arc::new(SqlOrderRepository::new(db_pool.clone())),
            customers: Arc::new(SqlCustomerRepository::new(db_pool.clone())),
            notifications: Arc::new(SqlNotificationRepository::new(db_pool.clone())),
            carts: Arc::new(SqlCartRepository::new(db_pool.clone())),
            analysis_log: Arc::new(SqlAnalysisLogRepository::new(db_pool.clone())),
            config: Arc::new(config),
            db_pool,
            templates,
            suppliers,
            payments,
        }
    }

    /// Stores an admin notification. Failures are logged and never fail the caller.
    pub async fn notify(&self, notification: Notification) {
        if let Err(error) = self.notifications.create(&notification).await {
            warn!(
                event_name = "notification.create_failed",
                kind = notification.kind.as_str(),
                error = %error,
                "notification was not stored"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::Utc;
    use dropshop_core::config::AppConfig;
    use dropshop_core::domain::product::{ProductDraft, ProductId, StoredProduct};
    use dropshop_db::{connect_with_settings, migrations};
    use dropshop_suppliers::SupplierRegistry;
    use rust_decimal::Decimal;

    use super::AppState;
    use crate::payments::fake::FakeGateway;
    use crate::payments::PaymentGateway;
    use crate::templates;

    pub const ADMIN_PASSWORD: &str = "correct-horse";

    pub async fn test_state() -> AppState {
        test_state_with(FakeGateway::with_status("succeeded"), SupplierRegistry::empty()).await
    }

    pub async fn test_state_with(gateway: FakeGateway, suppliers: SupplierRegistry) -> AppState {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");

        let mut config = AppConfig::default();
        config.admin.password = ADMIN_PASSWORD.to_string().into();
        let gateway: Arc<dyn PaymentGateway> = Arc::new(gateway);

        AppState::new(config, pool, templates::load(), suppliers, gateway)
    }

    pub async fn seed_product(state: &AppState, name: &str, cents: i64) -> StoredProduct {
        let product = ProductDraft {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Decimal::new(cents, 2),
            compare_at_price: None,
            cost_price: None,
            shipping_cost: None,
            category: "Home".to_string(),
            tags: Vec::new(),
            images: Vec::new(),
            stock_quantity: 25,
            active: true,
        }
        .into_product(ProductId::generate(), Utc::now());
        state.products.save(product.clone()).await.expect("seed product");
        product
    }
}
