use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use dropshop_core::domain::notification::{
    Notification, NotificationId, NotificationKind, NotificationPriority,
};

use super::{decode_err, parse_timestamp, NotificationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlNotificationRepository {
    pool: DbPool,
}

impl SqlNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification, RepositoryError> {
    let kind: String = row.try_get("kind").map_err(decode_err)?;
    let priority: String = row.try_get("priority").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    Ok(Notification {
        id: NotificationId(row.try_get("id").map_err(decode_err)?),
        title: row.try_get("title").map_err(decode_err)?,
        message: row.try_get("message").map_err(decode_err)?,
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown notification kind `{kind}`")))?,
        priority: NotificationPriority::parse(&priority)
            .ok_or_else(|| RepositoryError::Decode(format!("unknown priority `{priority}`")))?,
        link: row.try_get("link").map_err(decode_err)?,
        related_entity_id: row.try_get("related_entity_id").map_err(decode_err)?,
        is_read: row.try_get("is_read").map_err(decode_err)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO admin_notifications (id, title, message, kind, priority, link,
                related_entity_id, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id.0)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .bind(notification.priority.as_str())
        .bind(&notification.link)
        .bind(&notification.related_entity_id)
        .bind(notification.is_read)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(
        &self,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let sql = if unread_only {
            "SELECT id, title, message, kind, priority, link, related_entity_id, is_read, created_at
             FROM admin_notifications WHERE is_read = 0
             ORDER BY created_at DESC, id ASC LIMIT ?"
        } else {
            "SELECT id, title, message, kind, priority, link, related_entity_id, is_read, created_at
             FROM admin_notifications
             ORDER BY created_at DESC, id ASC LIMIT ?"
        };
        let rows = sqlx::query(sql).bind(i64::from(limit)).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_notification).collect()
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE admin_notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM admin_notifications WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("count").map_err(decode_err)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use dropshop_core::domain::notification::{Notification, NotificationId, NotificationPriority};

    use super::SqlNotificationRepository;
    use crate::repositories::NotificationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlNotificationRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlNotificationRepository::new(pool)
    }

    #[tokio::test]
    async fn unread_lifecycle() {
        let repo = setup().await;
        let mut older = Notification::new_customer("c-1", "ada@example.com");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = Notification::low_stock("p-1", "Desk Lamp", 2);

        repo.create(&older).await.expect("create");
        repo.create(&newer).await.expect("create");
        assert_eq!(repo.unread_count().await.expect("count"), 2);

        let listed = repo.list(false, 10).await.expect("list");
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[0].priority, NotificationPriority::Critical);
        assert_eq!(listed[0].link, newer.link);

        assert!(repo.mark_read(&newer.id).await.expect("mark"));
        assert!(!repo.mark_read(&NotificationId("missing".to_string())).await.expect("mark"));

        let unread = repo.list(true, 10).await.expect("unread");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, older.id);

        assert_eq!(repo.mark_all_read().await.expect("mark all"), 1);
        assert_eq!(repo.unread_count().await.expect("count"), 0);
    }
}
