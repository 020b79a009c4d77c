//! User-visible notifications (the toasts of the page).

use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Fire-and-forget sink. Implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::Error(message.to_string()));
    }
}

/// Prints notifications to stderr so they never interleave with the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => {
                info!(notification = %message, "success");
                eprintln!("✔ {}", message);
            }
            Notification::Error(message) => {
                warn!(notification = %message, "error");
                eprintln!("✘ {}", message);
            }
        }
    }
}
