//! Stock notification models and lifecycle

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock condition a notification reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "notification_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Expiry,
    LowStock,
    OutOfStock,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Expiry => "expiry",
            NotificationType::LowStock => "low_stock",
            NotificationType::OutOfStock => "out_of_stock",
        }
    }
}

/// Lifecycle state of a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Unread,
    Read,
    Deleted,
}

impl NotificationState {
    pub fn from_read_flag(is_read: bool) -> Self {
        if is_read {
            NotificationState::Read
        } else {
            NotificationState::Unread
        }
    }
}

/// User action on a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    MarkRead,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification is deleted")]
pub struct NotificationGone;

impl NotificationState {
    /// Apply a user action. Marking a read notification read again is a no-op.
    pub fn apply(self, action: NotificationAction) -> Result<Self, NotificationGone> {
        match (self, action) {
            (NotificationState::Deleted, _) => Err(NotificationGone),
            (_, NotificationAction::MarkRead) => Ok(NotificationState::Read),
            (_, NotificationAction::Delete) => Ok(NotificationState::Deleted),
        }
    }
}

/// Key under which unread notifications are deduplicated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub medicine_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
}

/// A notification ready to be inserted
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub medicine_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
}

impl NewNotification {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            user_id: self.user_id,
            notification_type: self.notification_type,
            medicine_id: self.medicine_id,
            batch_id: self.batch_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_to_read() {
        assert_eq!(
            NotificationState::Unread.apply(NotificationAction::MarkRead),
            Ok(NotificationState::Read)
        );
    }

    #[test]
    fn test_read_is_idempotent() {
        assert_eq!(
            NotificationState::Read.apply(NotificationAction::MarkRead),
            Ok(NotificationState::Read)
        );
    }

    #[test]
    fn test_delete_from_any_live_state() {
        for state in [NotificationState::Unread, NotificationState::Read] {
            assert_eq!(state.apply(NotificationAction::Delete), Ok(NotificationState::Deleted));
        }
    }

    #[test]
    fn test_deleted_is_terminal() {
        for action in [NotificationAction::MarkRead, NotificationAction::Delete] {
            assert_eq!(NotificationState::Deleted.apply(action), Err(NotificationGone));
        }
    }

    #[test]
    fn test_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&NotificationType::OutOfStock).unwrap(),
            "\"out_of_stock\""
        );
        assert_eq!(NotificationType::LowStock.as_str(), "low_stock");
    }
}
