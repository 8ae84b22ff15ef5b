use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::domain::product::{ProductId, StoredProduct};

use super::{
    decode_err, parse_decimal, parse_timestamp, CategoryCount, ProductQuery, ProductRepository,
    RepositoryError,
};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, compare_at_price, cost_price,
    shipping_cost, category, tags, images, stock_quantity, active, source, external_id, ai_score,
    created_at, updated_at";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<rust_decimal::Decimal>, RepositoryError> {
    let raw: Option<String> = row.try_get(column).map_err(decode_err)?;
    raw.as_deref().map(parse_decimal).transpose()
}

fn string_list(row: &SqliteRow, column: &str) -> Result<Vec<String>, RepositoryError> {
    let raw: String = row.try_get(column).map_err(decode_err)?;
    serde_json::from_str(&raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid {column} json: {error}")))
}

pub(crate) fn row_to_product(row: &SqliteRow) -> Result<StoredProduct, RepositoryError> {
    let price: String = row.try_get("price").map_err(decode_err)?;
    let source: String = row.try_get("source").map_err(decode_err)?;
    let ai_score: Option<i64> = row.try_get("ai_score").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    Ok(StoredProduct {
        id: ProductId(row.try_get("id").map_err(decode_err)?),
        name: row.try_get("name").map_err(decode_err)?,
        slug: row.try_get("slug").map_err(decode_err)?,
        description: row.try_get("description").map_err(decode_err)?,
        price: parse_decimal(&price)?,
        compare_at_price: optional_decimal(row, "compare_at_price")?,
        cost_price: optional_decimal(row, "cost_price")?,
        shipping_cost: optional_decimal(row, "shipping_cost")?,
        category: row.try_get("category").map_err(decode_err)?,
        tags: string_list(row, "tags")?,
        images: string_list(row, "images")?,
        stock_quantity: row.try_get("stock_quantity").map_err(decode_err)?,
        active: row.try_get("active").map_err(decode_err)?,
        source: SupplierKind::parse(&source)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown product source `{source}`")))?,
        external_id: row.try_get("external_id").map_err(decode_err)?,
        ai_score: ai_score
            .map(|score| u8::try_from(score).map_err(decode_err))
            .transpose()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ProductQuery) {
    builder.push(" WHERE 1 = 1");
    if query.active_only {
        builder.push(" AND active = 1");
    }
    if let Some(category) = query.category.as_deref().filter(|value| !value.trim().is_empty()) {
        builder.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder
            .push(" AND (lower(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(description) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn json_list(values: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(values).map_err(decode_err)
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<StoredProduct>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row = sqlx::query(&sql).bind(&id.0).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
    ) -> Result<Option<StoredProduct>, RepositoryError> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE source = ? AND external_id = ?");
        let row = sqlx::query(&sql)
            .bind(source.as_str())
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: StoredProduct) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO products (id, name, slug, description, price, compare_at_price, cost_price,
                shipping_cost, category, tags, images, stock_quantity, active, source, external_id,
                ai_score, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug,
                description = excluded.description,
                price = excluded.price,
                compare_at_price = excluded.compare_at_price,
                cost_price = excluded.cost_price,
                shipping_cost = excluded.shipping_cost,
                category = excluded.category,
                tags = excluded.tags,
                images = excluded.images,
                stock_quantity = excluded.stock_quantity,
                active = excluded.active,
                ai_score = excluded.ai_score,
                updated_at = excluded.updated_at",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.compare_at_price.map(|value| value.to_string()))
        .bind(product.cost_price.map(|value| value.to_string()))
        .bind(product.shipping_cost.map(|value| value.to_string()))
        .bind(&product.category)
        .bind(json_list(&product.tags)?)
        .bind(json_list(&product.images)?)
        .bind(product.stock_quantity)
        .bind(product.active)
        .bind(product.source.as_str())
        .bind(&product.external_id)
        .bind(product.ai_score.map(i64::from))
        .bind(product.created_at.to_rfc3339())
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_if_absent(&self, product: StoredProduct) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO products (id, name, slug, description, price, compare_at_price, cost_price,
                shipping_cost, category, tags, images, stock_quantity, active, source, external_id,
                ai_score, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT DO NOTHING",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.compare_at_price.map(|value| value.to_string()))
        .bind(product.cost_price.map(|value| value.to_string()))
        .bind(product.shipping_cost.map(|value| value.to_string()))
        .bind(&product.category)
        .bind(json_list(&product.tags)?)
        .bind(json_list(&product.images)?)
        .bind(product.stock_quantity)
        .bind(product.active)
        .bind(product.source.as_str())
        .bind(&product.external_id)
        .bind(product.ai_score.map(i64::from))
        .bind(product.created_at.to_rfc3339())
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<StoredProduct>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filters(&mut builder, query);
        builder
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn count(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS count FROM products");
        push_filters(&mut builder, query);
        let row = builder.build().fetch_one(&self.pool).await?;
        row.try_get("count").map_err(decode_err)
    }

    async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT category, COUNT(*) AS product_count
             FROM products
             WHERE active = 1
             GROUP BY category
             ORDER BY category ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CategoryCount {
                    category: row.try_get("category").map_err(decode_err)?,
                    product_count: row.try_get("product_count").map_err(decode_err)?,
                })
            })
            .collect()
    }

    async fn set_stock_by_external_id(
        &self,
        source: SupplierKind,
        external_id: &str,
        stock_quantity: i64,
    ) -> Result<Option<StoredProduct>, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = ?, updated_at = ?
             WHERE source = ? AND external_id = ?",
        )
        .bind(stock_quantity.max(0))
        .bind(Utc::now().to_rfc3339())
        .bind(source.as_str())
        .bind(external_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_external_id(source, external_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use dropshop_core::domain::candidate::SupplierKind;
    use dropshop_core::domain::product::{ProductId, StoredProduct};

    use super::SqlProductRepository;
    use crate::repositories::{ProductQuery, ProductRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn product(id: &str, name: &str, category: &str, age_minutes: i64) -> StoredProduct {
        let at = Utc::now() - Duration::minutes(age_minutes);
        StoredProduct {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: format!("{name} description"),
            price: Decimal::new(1999, 2),
            compare_at_price: Some(Decimal::new(2599, 2)),
            cost_price: Some(Decimal::new(800, 2)),
            shipping_cost: None,
            category: category.to_string(),
            tags: vec!["gift".to_string()],
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
            stock_quantity: 10,
            active: true,
            source: SupplierKind::Cj,
            external_id: Some(format!("cj-{id}")),
            ai_score: Some(81),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let repo = SqlProductRepository::new(setup().await);
        let saved = product("p-1", "Desk Lamp", "Home", 0);

        repo.save(saved.clone()).await.expect("save");
        let found = repo.find_by_id(&saved.id).await.expect("find").expect("present");

        assert_eq!(found.name, "Desk Lamp");
        assert_eq!(found.price, Decimal::new(1999, 2));
        assert_eq!(found.tags, vec!["gift".to_string()]);
        assert_eq!(found.ai_score, Some(81));
        assert_eq!(found.source, SupplierKind::Cj);
    }

    #[tokio::test]
    async fn insert_if_absent_ignores_same_supplier_product() {
        let repo = SqlProductRepository::new(setup().await);

        let first = product("p-1", "Desk Lamp", "Home", 0);
        let mut again = product("p-2", "Desk Lamp", "Home", 0);
        again.external_id = first.external_id.clone();

        assert!(repo.insert_if_absent(first).await.expect("first insert"));
        assert!(!repo.insert_if_absent(again).await.expect("second insert"));
        assert_eq!(repo.count(&ProductQuery::default()).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn list_filters_active_category_and_search() {
        let repo = SqlProductRepository::new(setup().await);
        repo.save(product("p-1", "Desk Lamp", "Home", 3)).await.expect("save");
        repo.save(product("p-2", "Floor Lamp", "Home", 2)).await.expect("save");
        repo.save(product("p-3", "Yoga Mat", "Fitness", 1)).await.expect("save");
        let mut hidden = product("p-4", "Old Lamp", "Home", 0);
        hidden.active = false;
        repo.save(hidden).await.expect("save");

        let query = ProductQuery {
            active_only: true,
            category: Some("Home".to_string()),
            search: Some("LAMP".to_string()),
            limit: 10,
            offset: 0,
        };
        let listed = repo.list(&query).await.expect("list");
        let names: Vec<&str> = listed.iter().map(|product| product.name.as_str()).collect();

        assert_eq!(names, vec!["Floor Lamp", "Desk Lamp"]);
        assert_eq!(repo.count(&query).await.expect("count"), 2);

        let paged = repo
            .list(&ProductQuery { active_only: true, limit: 1, offset: 1, ..ProductQuery::default() })
            .await
            .expect("paged list");
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].name, "Floor Lamp");
    }

    #[tokio::test]
    async fn categories_count_only_active_products() {
        let repo = SqlProductRepository::new(setup().await);
        repo.save(product("p-1", "Desk Lamp", "Home", 0)).await.expect("save");
        repo.save(product("p-2", "Yoga Mat", "Fitness", 0)).await.expect("save");
        let mut hidden = product("p-3", "Kettlebell", "Fitness", 0);
        hidden.active = false;
        repo.save(hidden).await.expect("save");

        let categories = repo.categories().await.expect("categories");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "Fitness");
        assert_eq!(categories[0].product_count, 1);
    }

    #[tokio::test]
    async fn stock_updates_match_supplier_identity() {
        let repo = SqlProductRepository::new(setup().await);
        repo.save(product("p-1", "Desk Lamp", "Home", 0)).await.expect("save");

        let updated = repo
            .set_stock_by_external_id(SupplierKind::Cj, "cj-p-1", 0)
            .await
            .expect("update")
            .expect("product exists");
        assert_eq!(updated.stock_quantity, 0);

        let missing = repo
            .set_stock_by_external_id(SupplierKind::Zendrop, "cj-p-1", 5)
            .await
            .expect("update");
        assert!(missing.is_none());
    }
}
