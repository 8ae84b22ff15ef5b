use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use dropshop_core::domain::analysis::AnalysisLogEntry;
use dropshop_core::domain::candidate::SupplierKind;
use dropshop_core::intelligence::{Decision, DemandLevel};

use super::{decode_err, parse_timestamp, AnalysisLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAnalysisLogRepository {
    pool: DbPool,
}

impl SqlAnalysisLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn string_list(row: &SqliteRow, column: &str) -> Result<Vec<String>, RepositoryError> {
    let raw: String = row.try_get(column).map_err(decode_err)?;
    serde_json::from_str(&raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid {column} json: {error}")))
}

fn row_to_entry(row: &SqliteRow) -> Result<AnalysisLogEntry, RepositoryError> {
    let supplier: String = row.try_get("supplier").map_err(decode_err)?;
    let decision: String = row.try_get("decision").map_err(decode_err)?;
    let demand_level: String = row.try_get("demand_level").map_err(decode_err)?;
    let ai_score: i64 = row.try_get("ai_score").map_err(decode_err)?;
    let analyzed_at: String = row.try_get("analyzed_at").map_err(decode_err)?;

    Ok(AnalysisLogEntry {
        id: row.try_get("id").map_err(decode_err)?,
        run_id: row.try_get("run_id").map_err(decode_err)?,
        supplier: SupplierKind::parse(&supplier)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown supplier `{supplier}`")))?,
        external_id: row.try_get("external_id").map_err(decode_err)?,
        product_name: row.try_get("product_name").map_err(decode_err)?,
        decision: Decision::parse(&decision)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown decision `{decision}`")))?,
        ai_score: u8::try_from(ai_score).map_err(decode_err)?,
        profit_margin: row.try_get("profit_margin").map_err(decode_err)?,
        sentiment_score: row.try_get("sentiment_score").map_err(decode_err)?,
        demand_level: DemandLevel::parse(&demand_level).ok_or_else(|| {
            RepositoryError::Decode(format!("unknown demand level `{demand_level}`"))
        })?,
        reasons: string_list(row, "reasons")?,
        warnings: string_list(row, "warnings")?,
        recommendation: row.try_get("recommendation").map_err(decode_err)?,
        analyzed_at: parse_timestamp(&analyzed_at)?,
    })
}

#[async_trait::async_trait]
impl AnalysisLogRepository for SqlAnalysisLogRepository {
    async fn append(&self, entry: AnalysisLogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product_analysis_log (id, run_id, supplier, external_id, product_name,
                decision, ai_score, profit_margin, sentiment_score, demand_level, reasons, warnings,
                recommendation, analyzed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.run_id)
        .bind(entry.supplier.as_str())
        .bind(&entry.external_id)
        .bind(&entry.product_name)
        .bind(entry.decision.as_str())
        .bind(i64::from(entry.ai_score))
        .bind(entry.profit_margin)
        .bind(entry.sentiment_score)
        .bind(entry.demand_level.as_str())
        .bind(serde_json::to_string(&entry.reasons).map_err(decode_err)?)
        .bind(serde_json::to_string(&entry.warnings).map_err(decode_err)?)
        .bind(&entry.recommendation)
        .bind(entry.analyzed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn analyzed_on(
        &self,
        supplier: SupplierKind,
        external_id: &str,
        day: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        // analyzed_at is stored as UTC rfc3339, so the date prefix is the UTC day.
        let row = sqlx::query(
            "SELECT EXISTS(
                SELECT 1 FROM product_analysis_log
                WHERE supplier = ? AND external_id = ? AND substr(analyzed_at, 1, 10) = ?
             ) AS seen",
        )
        .bind(supplier.as_str())
        .bind(external_id)
        .bind(day.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await?;
        let seen: i64 = row.try_get("seen").map_err(decode_err)?;
        Ok(seen == 1)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AnalysisLogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, run_id, supplier, external_id, product_name, decision, ai_score,
                profit_margin, sentiment_score, demand_level, reasons, warnings, recommendation,
                analyzed_at
             FROM product_analysis_log
             ORDER BY analyzed_at DESC, id ASC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use dropshop_core::domain::analysis::AnalysisLogEntry;
    use dropshop_core::domain::candidate::SupplierKind;
    use dropshop_core::intelligence::{Decision, DemandLevel};

    use super::SqlAnalysisLogRepository;
    use crate::repositories::AnalysisLogRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlAnalysisLogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlAnalysisLogRepository::new(pool)
    }

    fn entry(id: &str, external_id: &str, hours: i64) -> AnalysisLogEntry {
        AnalysisLogEntry {
            id: id.to_string(),
            run_id: "run-1".to_string(),
            supplier: SupplierKind::Zendrop,
            external_id: external_id.to_string(),
            product_name: "Posture Corrector".to_string(),
            decision: Decision::Approved,
            ai_score: 77,
            profit_margin: 58.5,
            sentiment_score: 0.66,
            demand_level: DemandLevel::Steady,
            reasons: vec!["healthy margin".to_string()],
            warnings: Vec::new(),
            recommendation: "winning product, AI score 77/100".to_string(),
            analyzed_at: Utc.with_ymd_and_hms(2026, 3, 14, 0, 30, 0).single().expect("valid")
                + Duration::hours(hours),
        }
    }

    #[tokio::test]
    async fn analyzed_on_matches_only_the_same_utc_day() {
        let repo = setup().await;
        repo.append(entry("a-1", "zd-1", 0)).await.expect("append");

        let day = Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).single().expect("valid").date_naive();
        assert!(repo.analyzed_on(SupplierKind::Zendrop, "zd-1", day).await.expect("query"));
        assert!(!repo
            .analyzed_on(SupplierKind::Zendrop, "zd-1", day.succ_opt().expect("next day"))
            .await
            .expect("query"));
        assert!(!repo.analyzed_on(SupplierKind::Cj, "zd-1", day).await.expect("query"));
    }

    #[tokio::test]
    async fn recent_returns_newest_first_with_decoded_fields() {
        let repo = setup().await;
        repo.append(entry("a-1", "zd-1", 0)).await.expect("append");
        repo.append(entry("a-2", "zd-2", 2)).await.expect("append");
        repo.append(entry("a-3", "zd-3", 1)).await.expect("append");

        let recent = repo.recent(2).await.expect("recent");
        let ids: Vec<&str> = recent.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["a-2", "a-3"]);
        assert_eq!(recent[0].decision, Decision::Approved);
        assert_eq!(recent[0].demand_level, DemandLevel::Steady);
        assert_eq!(recent[0].reasons, vec!["healthy margin".to_string()]);
    }
}
