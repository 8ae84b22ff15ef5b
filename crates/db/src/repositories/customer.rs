use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use dropshop_core::domain::customer::{normalize_email, Customer, CustomerId};

use super::{decode_err, parse_timestamp, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &SqliteRow) -> Result<Customer, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    Ok(Customer {
        id: CustomerId(row.try_get("id").map_err(decode_err)?),
        email: row.try_get("email").map_err(decode_err)?,
        name: row.try_get("name").map_err(decode_err)?,
        phone: row.try_get("phone").map_err(decode_err)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query("SELECT id, email, name, phone, created_at FROM customers WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let row =
            sqlx::query("SELECT id, email, name, phone, created_at FROM customers WHERE email = ?")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(row_to_customer).transpose()
    }

    async fn upsert_by_email(
        &self,
        customer: Customer,
    ) -> Result<(Customer, bool), RepositoryError> {
        let email = normalize_email(&customer.email);
        let inserted = sqlx::query(
            "INSERT INTO customers (id, email, name, phone, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET
                name = COALESCE(excluded.name, customers.name),
                phone = COALESCE(excluded.phone, customers.phone)",
        )
        .bind(&customer.id.0)
        .bind(&email)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let stored = self.find_by_email(&email).await?.ok_or_else(|| {
            RepositoryError::Decode(format!("customer `{email}` missing after upsert"))
        })?;
        // The conflict branch also reports one affected row, so compare ids.
        let created = inserted.rows_affected() == 1 && stored.id == customer.id;
        Ok((stored, created))
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, email, name, phone, created_at
             FROM customers
             ORDER BY created_at DESC, id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_customer).collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM customers").fetch_one(&self.pool).await?;
        row.try_get("count").map_err(decode_err)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use dropshop_core::domain::customer::Customer;

    use super::SqlCustomerRepository;
    use crate::repositories::CustomerRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlCustomerRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCustomerRepository::new(pool)
    }

    #[tokio::test]
    async fn upsert_creates_once_per_normalized_email() {
        let repo = setup().await;

        let (first, created) = repo
            .upsert_by_email(Customer::new("Buyer@Example.com", None, None, Utc::now()))
            .await
            .expect("first upsert");
        assert!(created);
        assert_eq!(first.email, "buyer@example.com");

        let (second, created) = repo
            .upsert_by_email(Customer::new(
                " buyer@example.COM ",
                Some("Ada".to_string()),
                None,
                Utc::now(),
            ))
            .await
            .expect("second upsert");
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.name.as_deref(), Some("Ada"));
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn upsert_keeps_known_fields_when_new_ones_are_blank() {
        let repo = setup().await;
        repo.upsert_by_email(Customer::new(
            "ada@example.com",
            Some("Ada".to_string()),
            Some("555-0100".to_string()),
            Utc::now(),
        ))
        .await
        .expect("seed");

        let (stored, _) = repo
            .upsert_by_email(Customer::new("ada@example.com", None, None, Utc::now()))
            .await
            .expect("upsert");
        assert_eq!(stored.name.as_deref(), Some("Ada"));
        assert_eq!(stored.phone.as_deref(), Some("555-0100"));

        let found = repo.find_by_id(&stored.id).await.expect("find").expect("exists");
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(repo.list(10, 0).await.expect("list").len(), 1);
    }
}
