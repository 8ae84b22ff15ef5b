use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Product,
    Customer,
    Import,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Product => "product",
            Self::Customer => "customer",
            Self::Import => "import",
            Self::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "order" => Some(Self::Order),
            "product" => Some(Self::Product),
            "customer" => Some(Self::Customer),
            "import" => Some(Self::Import),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Stock updates at or below this level raise a low-stock alert.
pub const LOW_STOCK_LEVEL: i64 = 10;

/// Stock at or below this level escalates a low-stock alert to critical.
pub const CRITICAL_STOCK_LEVEL: i64 = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub link: Option<String>,
    pub related_entity_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        priority: NotificationPriority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId(Uuid::new_v4().to_string()),
            title: title.into(),
            message: message.into(),
            kind,
            priority,
            link: None,
            related_entity_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_related(mut self, entity_id: impl Into<String>) -> Self {
        self.related_entity_id = Some(entity_id.into());
        self
    }

    pub fn new_order(order_id: &str, order_number: &str, total: &str) -> Self {
        Self::new(
            NotificationKind::Order,
            NotificationPriority::High,
            "New order received",
            format!("Order {order_number} was placed for {total}."),
        )
        .with_link(format!("/admin/orders/{order_id}"))
        .with_related(order_id)
    }

    pub fn order_status_changed(order_id: &str, order_number: &str, status: &str) -> Self {
        Self::new(
            NotificationKind::Order,
            NotificationPriority::Normal,
            "Order status updated",
            format!("Order {order_number} is now {status}."),
        )
        .with_link(format!("/admin/orders/{order_id}"))
        .with_related(order_id)
    }

    pub fn low_stock(product_id: &str, product_name: &str, stock: i64) -> Self {
        let priority = if stock <= CRITICAL_STOCK_LEVEL {
            NotificationPriority::Critical
        } else {
            NotificationPriority::High
        };
        Self::new(
            NotificationKind::Product,
            priority,
            "Low stock",
            format!("{product_name} has {stock} units left."),
        )
        .with_link(format!("/admin/products/{product_id}"))
        .with_related(product_id)
    }

    pub fn new_customer(customer_id: &str, email: &str) -> Self {
        Self::new(
            NotificationKind::Customer,
            NotificationPriority::Low,
            "New customer",
            format!("{email} placed their first order."),
        )
        .with_link(format!("/admin/customers/{customer_id}"))
        .with_related(customer_id)
    }

    pub fn import_finished(run_id: &str, supplier: &str, imported: usize, analyzed: usize) -> Self {
        Self::new(
            NotificationKind::Import,
            NotificationPriority::Normal,
            "Supplier import finished",
            format!("{supplier}: imported {imported} of {analyzed} analyzed products."),
        )
        .with_related(run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationKind, NotificationPriority};

    #[test]
    fn low_stock_escalates_at_five_units() {
        assert_eq!(Notification::low_stock("p", "Lamp", 5).priority, NotificationPriority::Critical);
        assert_eq!(Notification::low_stock("p", "Lamp", 6).priority, NotificationPriority::High);
    }

    #[test]
    fn helper_priorities() {
        let order = Notification::new_order("o-1", "ED-1-AAAAAA", "$10.00");
        assert_eq!(order.kind, NotificationKind::Order);
        assert_eq!(order.priority, NotificationPriority::High);
        assert_eq!(order.related_entity_id.as_deref(), Some("o-1"));
        assert!(!order.is_read);

        assert_eq!(
            Notification::order_status_changed("o-1", "ED-1", "shipped").priority,
            NotificationPriority::Normal
        );
        assert_eq!(Notification::new_customer("c-1", "a@b.co").priority, NotificationPriority::Low);
        assert_eq!(
            Notification::import_finished("run", "cj", 1, 3).kind,
            NotificationKind::Import
        );
    }

    #[test]
    fn priority_ordering_ranks_critical_highest() {
        assert!(NotificationPriority::Critical > NotificationPriority::High);
        assert!(NotificationPriority::Low < NotificationPriority::Normal);
    }
}
