use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotification {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: Option<String>,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl AppNotification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            title: None,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Notifier port
// ---------------------------------------------------------------------------

/// Sink for user-facing success/error notices.
///
/// Wizard and poller logic report outcomes through this trait instead of a
/// process-wide toast, so any shell can decide how to present them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: AppNotification);

    fn success(&self, title: &str, message: &str) {
        self.notify(AppNotification::new(NotificationType::Success, message).with_title(title));
    }

    fn error(&self, title: &str, message: &str) {
        self.notify(AppNotification::new(NotificationType::Error, message).with_title(title));
    }

    fn info(&self, message: &str) {
        self.notify(AppNotification::new(NotificationType::Info, message));
    }
}

/// Discards everything. Used where no shell is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: AppNotification) {}
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory notification store, newest first.
pub struct NotificationStore {
    notifications: Vec<AppNotification>,
    max_notifications: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(max_notifications: usize) -> Self {
        Self {
            notifications: Vec::new(),
            max_notifications,
        }
    }

    pub fn push(&mut self, notification: AppNotification) {
        self.notifications.insert(0, notification);
        self.notifications.truncate(self.max_notifications);
    }

    pub fn mark_read(&mut self, id: &str) {
        if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.notifications {
            n.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn all(&self) -> &[AppNotification] {
        &self.notifications
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe [`NotificationStore`] that implements [`Notifier`].
#[derive(Default)]
pub struct NotificationCenter {
    store: Mutex<NotificationStore>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all notifications, newest first.
    pub fn snapshot(&self) -> Vec<AppNotification> {
        self.store.lock().all().to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.store.lock().unread_count()
    }

    pub fn mark_all_read(&self) {
        self.store.lock().mark_all_read();
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: AppNotification) {
        tracing::debug!(kind = ?notification.notification_type, "{}", notification.message);
        self.store.lock().push(notification);
    }
}
