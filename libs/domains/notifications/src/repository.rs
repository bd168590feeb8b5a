use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{Notification, NotificationFilter};

/// Repository trait for the persisted notification log.
///
/// Records are append-only apart from the read flag; there is deliberately
/// no delete operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification record
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification>;

    /// Get a notification by ID
    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>>;

    /// List a recipient's notifications, newest first
    async fn list_by_account(
        &self,
        account_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<Notification>>;

    /// Flip the read flag and stamp when it happened
    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> NotificationResult<Notification>;

    /// Unread count for a recipient
    async fn count_unread(&self, account_id: Uuid) -> NotificationResult<usize>;
}

/// In-memory implementation of NotificationRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> NotificationResult<Notification> {
        let mut notifications = self.notifications.write().await;
        notifications.insert(notification.id, notification.clone());

        tracing::debug!(
            notification_id = %notification.id,
            account_id = %notification.account_id,
            kind = %notification.kind,
            "Stored notification"
        );
        Ok(notification)
    }

    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.get(&id).cloned())
    }

    async fn list_by_account(
        &self,
        account_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;

        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| {
                if n.account_id != account_id {
                    return false;
                }
                if let Some(kind) = filter.kind {
                    if n.kind != kind {
                        return false;
                    }
                }
                if filter.unread_only && n.is_read {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let result: Vec<Notification> = result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();

        Ok(result)
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> NotificationResult<Notification> {
        let mut notifications = self.notifications.write().await;

        let notification = notifications
            .get_mut(&id)
            .ok_or(NotificationError::NotFound(id))?;

        notification.is_read = true;
        notification.read_at = Some(at);

        Ok(notification.clone())
    }

    async fn count_unread(&self, account_id: Uuid) -> NotificationResult<usize> {
        let notifications = self.notifications.read().await;

        Ok(notifications
            .values()
            .filter(|n| n.account_id == account_id && !n.is_read)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, Priority};

    fn notification(account_id: Uuid, kind: NotificationKind) -> Notification {
        Notification::new(
            account_id,
            kind,
            Priority::Normal,
            "message".to_string(),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_insert_and_list_by_account() {
        let repo = InMemoryNotificationRepository::new();
        let account_id = Uuid::now_v7();

        repo.insert(notification(account_id, NotificationKind::ProfileCreated))
            .await
            .unwrap();
        repo.insert(notification(account_id, NotificationKind::Expired))
            .await
            .unwrap();
        repo.insert(notification(Uuid::now_v7(), NotificationKind::Expired))
            .await
            .unwrap();

        let listed = repo
            .list_by_account(account_id, NotificationFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_updates_flag_and_timestamp() {
        let repo = InMemoryNotificationRepository::new();
        let account_id = Uuid::now_v7();

        let created = repo
            .insert(notification(account_id, NotificationKind::ExpiryApproaching))
            .await
            .unwrap();
        assert_eq!(repo.count_unread(account_id).await.unwrap(), 1);

        let at = Utc::now();
        let read = repo.mark_read(created.id, at).await.unwrap();

        assert!(read.is_read);
        assert_eq!(read.read_at, Some(at));
        assert_eq!(repo.count_unread(account_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unread_only_filter() {
        let repo = InMemoryNotificationRepository::new();
        let account_id = Uuid::now_v7();

        let first = repo
            .insert(notification(account_id, NotificationKind::General))
            .await
            .unwrap();
        repo.insert(notification(account_id, NotificationKind::General))
            .await
            .unwrap();

        repo.mark_read(first.id, Utc::now()).await.unwrap();

        let unread = repo
            .list_by_account(
                account_id,
                NotificationFilter {
                    unread_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
    }
}
