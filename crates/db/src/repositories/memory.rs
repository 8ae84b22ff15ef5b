use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use dropshop_core::domain::analysis::AnalysisLogEntry;
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::notification::{Notification, NotificationId};
use dropshop_core::domain::product::{ProductId, StoredProduct};

use super::{
    AnalysisLogRepository, CategoryCount, NotificationRepository, ProductQuery, ProductRepository,
    RepositoryError,
};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, StoredProduct>>,
}

fn matches(product: &StoredProduct, query: &ProductQuery) -> bool {
    if query.active_only && !product.active {
        return false;
    }
    if let Some(category) = query.category.as_deref().filter(|value| !value.trim().is_empty()) {
        if product.category != category {
            return false;
        }
    }
    match query.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(search) => {
            let needle = search.to_lowercase();
            product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
        }
        None => true,
    }
}

fn same_supplier_product(left: &StoredProduct, right: &StoredProduct) -> bool {
    left.source == right.source && left.external_id.is_some() && left.external_id == right.external_id
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<StoredProduct>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn find_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
    ) -> Result<Option<StoredProduct>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|product| {
                product.source == source && product.external_id.as_deref() == Some(external_id)
            })
            .cloned())
    }

    async fn save(&self, product: StoredProduct) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }

    async fn insert_if_absent(&self, product: StoredProduct) -> Result<bool, RepositoryError> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id.0)
            || products.values().any(|existing| same_supplier_product(existing, &product))
        {
            return Ok(false);
        }
        products.insert(product.id.0.clone(), product);
        Ok(true)
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<StoredProduct>, RepositoryError> {
        let products = self.products.read().await;
        let mut listed: Vec<StoredProduct> =
            products.values().filter(|product| matches(product, query)).cloned().collect();
        listed.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| left.id.0.cmp(&right.id.0))
        });
        Ok(listed
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|product| matches(product, query)).count() as i64)
    }

    async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let products = self.products.read().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for product in products.values().filter(|product| product.active) {
            *counts.entry(product.category.clone()).or_default() += 1;
        }
        let mut categories: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, product_count)| CategoryCount { category, product_count })
            .collect();
        categories.sort_by(|left, right| left.category.cmp(&right.category));
        Ok(categories)
    }

    async fn set_stock_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
        stock_quantity: i64,
    ) -> Result<Option<StoredProduct>, RepositoryError> {
        let mut products = self.products.write().await;
        let found = products.values_mut().find(|product| {
            product.source == source && product.external_id.as_deref() == Some(external_id)
        });
        Ok(found.map(|product| {
            product.stock_quantity = stock_quantity.max(0);
            product.updated_at = chrono::Utc::now();
            product.clone()
        }))
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisLogRepository {
    entries: RwLock<Vec<AnalysisLogEntry>>,
}

#[async_trait::async_trait]
impl AnalysisLogRepository for InMemoryAnalysisLogRepository {
    async fn append(&self, entry: AnalysisLogEntry) -> Result<(), RepositoryError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn analyzed_on(
        &self,
        supplier: SupplierKind,
        external_id: &str,
        day: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().any(|entry| {
            entry.supplier == supplier
                && entry.external_id == external_id
                && entry.analyzed_at.date_naive() == day
        }))
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AnalysisLogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut recent = entries.clone();
        recent.sort_by(|left, right| {
            right.analyzed_at.cmp(&left.analyzed_at).then_with(|| left.id.cmp(&right.id))
        });
        recent.truncate(limit as usize);
        Ok(recent)
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

#[async_trait::async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn list(
        &self,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.read().await;
        let mut listed: Vec<Notification> = notifications
            .iter()
            .filter(|notification| !unread_only || !notification.is_read)
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| left.id.0.cmp(&right.id.0))
        });
        listed.truncate(limit as usize);
        Ok(listed)
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<bool, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|notification| &notification.id == id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        let mut changed = 0;
        for notification in notifications.iter_mut().filter(|notification| !notification.is_read) {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self) -> Result<i64, RepositoryError> {
        let notifications = self.notifications.read().await;
        Ok(notifications.iter().filter(|notification| !notification.is_read).count() as i64)
    }
}
