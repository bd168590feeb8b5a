use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationFilter, NotificationKind, Priority};
use crate::repository::NotificationRepository;

/// PostgreSQL implementation of NotificationRepository using SeaORM
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    db: sea_orm::DatabaseConnection,
}

impl PostgresNotificationRepository {
    pub fn new(db: sea_orm::DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing notification rows from the database
#[derive(Debug, FromQueryResult)]
struct NotificationRow {
    id: Uuid,
    account_id: Uuid,
    kind: String,
    priority: String,
    message: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        use std::str::FromStr;

        Notification {
            id: row.id,
            account_id: row.account_id,
            kind: NotificationKind::from_str(&row.kind).unwrap_or(NotificationKind::General),
            priority: Priority::from_str(&row.priority).unwrap_or_default(),
            message: row.message,
            is_read: row.is_read,
            read_at: row.read_at,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification> {
        let sql = r#"
            INSERT INTO notifications (id, account_id, kind, priority, message,
                                       is_read, read_at, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                notification.id.into(),
                notification.account_id.into(),
                notification.kind.to_string().into(),
                notification.priority.to_string().into(),
                notification.message.clone().into(),
                notification.is_read.into(),
                notification.read_at.into(),
                notification.metadata.clone().into(),
                notification.created_at.into(),
            ],
        );

        let row = NotificationRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                NotificationError::Internal("Failed to insert notification".to_string())
            })?;

        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        let sql = "SELECT * FROM notifications WHERE id = $1";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = NotificationRow::find_by_statement(stmt).one(&self.db).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_by_account(
        &self,
        account_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<Notification>> {
        let sql = r#"
            SELECT * FROM notifications
            WHERE account_id = $1
              AND ($2::text IS NULL OR kind = $2)
              AND (NOT $3::boolean OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                account_id.into(),
                filter.kind.map(|k| k.to_string()).into(),
                filter.unread_only.into(),
                (filter.limit as i64).into(),
                (filter.offset as i64).into(),
            ],
        );

        let rows = NotificationRow::find_by_statement(stmt).all(&self.db).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> NotificationResult<Notification> {
        // The only mutation a record ever sees
        let sql = r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = $2
            WHERE id = $1
            RETURNING *
        "#;

        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into(), at.into()]);

        let row = NotificationRow::find_by_statement(stmt).one(&self.db).await?;

        row.map(|r| r.into()).ok_or(NotificationError::NotFound(id))
    }

    async fn count_unread(&self, account_id: Uuid) -> NotificationResult<usize> {
        let sql =
            "SELECT COUNT(*) AS count FROM notifications WHERE account_id = $1 AND is_read = FALSE";

        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [account_id.into()]);

        let row = CountRow::find_by_statement(stmt).one(&self.db).await?;

        Ok(row.map(|r| r.count as usize).unwrap_or(0))
    }
}
