pub mod config;
pub mod error;
pub mod logging;
pub mod notifications;

pub use config::ConsoleConfig;
pub use error::{ConsoleError, ErrorCategory};
pub use notifications::{
    AppNotification, NotificationCenter, NotificationStore, NotificationType, Notifier,
    NullNotifier,
};
