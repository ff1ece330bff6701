//! User-facing notifications emitted by commands and the sync channel.
//!
//! Notifications are observable side effects only; nothing in the store
//! depends on them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NotificationAction {
    /// Offer to re-run the named command.
    Retry { command: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            action: None,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, message)
    }

    /// Error notification carrying a retry affordance for `command`.
    pub fn error_with_retry(
        title: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            action: Some(NotificationAction::Retry {
                command: command.into(),
            }),
            ..Self::new(NotificationLevel::Error, title, message)
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(title = %n.title, "{}", n.message)
            }
            NotificationLevel::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            NotificationLevel::Error => tracing::error!(title = %n.title, "{}", n.message),
        }
    }
}

/// Fans notifications out to any number of listeners (UI toasts, tests).
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // No listeners is fine.
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_subscribers() {
        let notifier = BroadcastNotifier::default();
        let mut rx = notifier.subscribe();
        notifier.notify(Notification::error_with_retry(
            "Training failed",
            "quota exceeded",
            "start_training",
        ));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.level, NotificationLevel::Error);
        assert_eq!(
            got.action,
            Some(NotificationAction::Retry {
                command: "start_training".to_string()
            })
        );
    }

    #[test]
    fn broadcast_without_listeners_does_not_panic() {
        BroadcastNotifier::new(0).notify(Notification::info("hello", "world"));
    }
}
