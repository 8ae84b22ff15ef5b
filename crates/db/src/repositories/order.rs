use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use dropshop_core::domain::order::{Order, OrderId, OrderItem, OrderStatus, PaymentStatus};
use dropshop_core::domain::product::ProductId;

use super::{
    decode_err, parse_decimal, parse_timestamp, OrderQuery, OrderRepository, RepositoryError,
};
use crate::DbPool;

const ORDER_COLUMNS: &str = "id, order_number, customer_email, status, payment_status,
    payment_intent_id, subtotal, total, currency, shipping_address, billing_address,
    supplier_order_id, tracking_number, tracking_url, created_at, updated_at";

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: &str) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, unit_price
             FROM order_items
             WHERE order_id = ?
             ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let quantity: i64 = row.try_get("quantity").map_err(decode_err)?;
                let unit_price: String = row.try_get("unit_price").map_err(decode_err)?;
                Ok(OrderItem {
                    product_id: ProductId(row.try_get("product_id").map_err(decode_err)?),
                    product_name: row.try_get("product_name").map_err(decode_err)?,
                    quantity: u32::try_from(quantity).map_err(decode_err)?,
                    unit_price: parse_decimal(&unit_price)?,
                })
            })
            .collect()
    }

    async fn hydrate(&self, row: Option<SqliteRow>) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = row_to_order(&row)?;
        order.items = self.load_items(&order.id.0).await?;
        Ok(Some(order))
    }
}

fn json_column(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<serde_json::Value>, RepositoryError> {
    let raw: Option<String> = row.try_get(column).map_err(decode_err)?;
    raw.map(|value| {
        serde_json::from_str(&value)
            .map_err(|error| RepositoryError::Decode(format!("invalid {column} json: {error}")))
    })
    .transpose()
}

fn json_text(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(serde_json::Value::to_string)
}

fn row_to_order(row: &SqliteRow) -> Result<Order, RepositoryError> {
    let status: String = row.try_get("status").map_err(decode_err)?;
    let payment_status: String = row.try_get("payment_status").map_err(decode_err)?;
    let subtotal: String = row.try_get("subtotal").map_err(decode_err)?;
    let total: String = row.try_get("total").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    Ok(Order {
        id: OrderId(row.try_get("id").map_err(decode_err)?),
        order_number: row.try_get("order_number").map_err(decode_err)?,
        customer_email: row.try_get("customer_email").map_err(decode_err)?,
        status: OrderStatus::parse(&status)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status}`")))?,
        payment_status: PaymentStatus::parse(&payment_status).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown payment status `{payment_status}`"))
        })?,
        payment_intent_id: row.try_get("payment_intent_id").map_err(decode_err)?,
        subtotal: parse_decimal(&subtotal)?,
        total: parse_decimal(&total)?,
        currency: row.try_get("currency").map_err(decode_err)?,
        shipping_address: json_column(row, "shipping_address")?,
        billing_address: json_column(row, "billing_address")?,
        supplier_order_id: row.try_get("supplier_order_id").map_err(decode_err)?,
        tracking_number: row.try_get("tracking_number").map_err(decode_err)?,
        tracking_url: row.try_get("tracking_url").map_err(decode_err)?,
        items: Vec::new(),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_email, status, payment_status,
                payment_intent_id, subtotal, total, currency, shipping_address, billing_address,
                supplier_order_id, tracking_number, tracking_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id.0)
        .bind(&order.order_number)
        .bind(&order.customer_email)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.payment_intent_id)
        .bind(order.subtotal.to_string())
        .bind(order.total.to_string())
        .bind(&order.currency)
        .bind(json_text(&order.shipping_address))
        .bind(json_text(&order.billing_address))
        .bind(&order.supplier_order_id)
        .bind(&order.tracking_number)
        .bind(&order.tracking_url)
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&order.id.0)
            .bind(&item.product_id.0)
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row = sqlx::query(&sql).bind(&id.0).fetch_optional(&self.pool).await?;
        self.hydrate(row).await
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ? LIMIT 1");
        let row = sqlx::query(&sql).bind(order_number).fetch_optional(&self.pool).await?;
        self.hydrate(row).await
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_intent_id = ? LIMIT 1");
        let row = sqlx::query(&sql).bind(payment_intent_id).fetch_optional(&self.pool).await?;
        self.hydrate(row).await
    }

    async fn find_by_supplier_order_id(
        &self,
        supplier_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE supplier_order_id = ? LIMIT 1");
        let row = sqlx::query(&sql).bind(supplier_order_id).fetch_optional(&self.pool).await?;
        self.hydrate(row).await
    }

    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        if let Some(status) = query.status {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
        builder
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = row_to_order(&row)?;
            order.items = self.load_items(&order.id.0).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    async fn count(&self, status: Option<OrderStatus>) -> Result<i64, RepositoryError> {
        let row = match status {
            Some(status) => {
                sqlx::query("SELECT COUNT(*) AS count FROM orders WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => sqlx::query("SELECT COUNT(*) AS count FROM orders").fetch_one(&self.pool).await?,
        };
        row.try_get("count").map_err(decode_err)
    }

    async fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE orders SET
                customer_email = ?,
                status = ?,
                payment_status = ?,
                payment_intent_id = ?,
                shipping_address = ?,
                billing_address = ?,
                supplier_order_id = ?,
                tracking_number = ?,
                tracking_url = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&order.customer_email)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.payment_intent_id)
        .bind(json_text(&order.shipping_address))
        .bind(json_text(&order.billing_address))
        .bind(&order.supplier_order_id)
        .bind(&order.tracking_number)
        .bind(&order.tracking_url)
        .bind(order.updated_at.to_rfc3339())
        .bind(&order.id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn paid_revenue(&self) -> Result<Decimal, RepositoryError> {
        // Totals are TEXT decimals; SQLite SUM would go through floating point.
        let rows = sqlx::query("SELECT total FROM orders WHERE payment_status = 'paid'")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().try_fold(Decimal::ZERO, |sum, row| {
            let total: String = row.try_get("total").map_err(decode_err)?;
            Ok(sum + parse_decimal(&total)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use dropshop_core::domain::order::{Order, OrderId, OrderItem, OrderStatus, PaymentStatus};
    use dropshop_core::domain::product::ProductId;

    use super::SqlOrderRepository;
    use crate::repositories::{OrderQuery, OrderRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlOrderRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlOrderRepository::new(pool)
    }

    fn order(id: &str, age_minutes: i64) -> Order {
        let at = Utc::now() - Duration::minutes(age_minutes);
        let items = vec![
            OrderItem {
                product_id: ProductId("p-1".to_string()),
                product_name: "Desk Lamp".to_string(),
                quantity: 2,
                unit_price: Decimal::new(1999, 2),
            },
            OrderItem {
                product_id: ProductId("p-2".to_string()),
                product_name: "Yoga Mat".to_string(),
                quantity: 1,
                unit_price: Decimal::new(3500, 2),
            },
        ];
        Order {
            id: OrderId(id.to_string()),
            order_number: format!("ED-1-{id}"),
            customer_email: Some("buyer@example.com".to_string()),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: Some(format!("pi_{id}")),
            subtotal: Decimal::new(7498, 2),
            total: Decimal::new(7498, 2),
            currency: "usd".to_string(),
            shipping_address: Some(json!({"line1": "1 Main St", "city": "Austin"})),
            billing_address: None,
            supplier_order_id: None,
            tracking_number: None,
            tracking_url: None,
            items,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn create_persists_order_with_items() {
        let repo = setup().await;
        repo.create(&order("o-1", 0)).await.expect("create");

        let found = repo
            .find_by_id(&OrderId("o-1".to_string()))
            .await
            .expect("find")
            .expect("order exists");
        assert_eq!(found.items.len(), 2);
        assert_eq!(found.items[0].product_name, "Desk Lamp");
        assert_eq!(found.items_subtotal(), found.subtotal);
        assert_eq!(found.shipping_address, Some(json!({"line1": "1 Main St", "city": "Austin"})));

        let by_intent = repo.find_by_payment_intent("pi_o-1").await.expect("find by intent");
        assert_eq!(by_intent.map(|order| order.id), Some(OrderId("o-1".to_string())));
    }

    #[tokio::test]
    async fn duplicate_order_number_rolls_back_items() {
        let repo = setup().await;
        repo.create(&order("o-1", 0)).await.expect("create");

        let mut clash = order("o-2", 0);
        clash.order_number = "ED-1-o-1".to_string();
        assert!(repo.create(&clash).await.is_err());

        assert!(repo.find_by_id(&OrderId("o-2".to_string())).await.expect("find").is_none());
        assert_eq!(repo.count(None).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn update_persists_status_payment_and_tracking() {
        let repo = setup().await;
        let mut placed = order("o-1", 0);
        repo.create(&placed).await.expect("create");

        placed.mark_paid();
        placed.supplier_order_id = Some("zd-555".to_string());
        placed.transition_to(OrderStatus::Shipped).expect("ship");
        placed.tracking_number = Some("1Z999".to_string());
        repo.update(&placed).await.expect("update");

        let by_number = repo
            .find_by_order_number(&placed.order_number)
            .await
            .expect("find by number")
            .expect("order exists");
        assert_eq!(by_number.supplier_order_id.as_deref(), Some("zd-555"));
        assert!(repo.find_by_order_number("ED-0-NOPE00").await.expect("find").is_none());

        let found = repo
            .find_by_supplier_order_id("zd-555")
            .await
            .expect("find")
            .expect("order exists");
        assert_eq!(found.status, OrderStatus::Shipped);
        assert_eq!(found.payment_status, PaymentStatus::Paid);
        assert_eq!(found.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(repo.paid_revenue().await.expect("revenue"), Decimal::new(7498, 2));
    }

    #[tokio::test]
    async fn list_filters_by_status_newest_first() {
        let repo = setup().await;
        repo.create(&order("o-1", 10)).await.expect("create");
        repo.create(&order("o-2", 5)).await.expect("create");
        let mut cancelled = order("o-3", 1);
        cancelled.status = OrderStatus::Cancelled;
        repo.create(&cancelled).await.expect("create");

        let pending = repo
            .list(&OrderQuery { status: Some(OrderStatus::Pending), limit: 10, offset: 0 })
            .await
            .expect("list");
        let ids: Vec<&str> = pending.iter().map(|order| order.id.0.as_str()).collect();
        assert_eq!(ids, vec!["o-2", "o-1"]);
        assert_eq!(pending[0].items.len(), 2);
        assert_eq!(repo.count(Some(OrderStatus::Cancelled)).await.expect("count"), 1);
        assert_eq!(repo.paid_revenue().await.expect("revenue"), Decimal::ZERO);
    }
}
