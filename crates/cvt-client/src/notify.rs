//! User-facing notifications.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
    /// Neutral information.
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// A toast-like message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: Level,
    /// Headline.
    pub title: String,
    /// Optional detail, such as an error description.
    pub description: Option<String>,
}

impl Notification {
    /// A success notification.
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.into(),
            description: None,
        }
    }

    /// An error notification carrying `description`.
    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: title.into(),
            description: Some(description.into()),
        }
    }

    /// An informational notification.
    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            title: title.into(),
            description: None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => write!(f, "{}: {d}", self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, notification: Notification);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            Level::Error => warn!(title = %n.title, description = ?n.description, "notification"),
            Level::Success | Level::Info => info!(title = %n.title, "notification"),
        }
    }
}

/// Forwards notifications to a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// A notifier and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // The receiver may be gone after the view closed.
        let _ = self.tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_description() {
        assert_eq!(Notification::success("done").to_string(), "done");
        assert_eq!(
            Notification::error("failed", "503 from backend").to_string(),
            "failed: 503 from backend"
        );
    }

    #[tokio::test]
    async fn channel_notifier_forwards() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notification::info("hello"));
        let got = rx.recv().await.expect("notification");
        assert_eq!(got.level, Level::Info);
        assert_eq!(got.title, "hello");
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(Notification::success("ignored"));
    }
}
