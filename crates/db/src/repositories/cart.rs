use chrono::Utc;
use sqlx::Row;

use dropshop_core::domain::cart::{Cart, CartLine};
use dropshop_core::domain::product::ProductId;

use super::{decode_err, parse_decimal, CartRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CartRepository for SqlCartRepository {
    async fn load(&self, session_id: &str) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.product_id, c.quantity, p.name, p.price
             FROM cart_items c
             JOIN products p ON p.id = c.product_id
             WHERE c.session_id = ? AND p.active = 1
             ORDER BY c.position ASC, c.product_id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .iter()
            .map(|row| {
                let quantity: i64 = row.try_get("quantity").map_err(decode_err)?;
                let price: String = row.try_get("price").map_err(decode_err)?;
                Ok(CartLine {
                    product_id: ProductId(row.try_get("product_id").map_err(decode_err)?),
                    name: row.try_get("name").map_err(decode_err)?,
                    unit_price: parse_decimal(&price)?,
                    quantity: u32::try_from(quantity).map_err(decode_err)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Cart::from_lines(session_id, lines))
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_items WHERE session_id = ?")
            .bind(&cart.session_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        for (position, line) in cart.lines().iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_items (session_id, product_id, quantity, position, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&cart.session_id)
            .bind(&line.product_id.0)
            .bind(i64::from(line.quantity))
            .bind(i64::try_from(position).map_err(decode_err)?)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
