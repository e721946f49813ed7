//! Notifications written to the terminal.

use std::io::Write;

use cvt_client::{Level, Notification, Notifier};

/// Prints notifications to stderr so they never mix with command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    /// Render one notification.
    #[must_use]
    pub fn render(notification: &Notification) -> String {
        let mark = match notification.level {
            Level::Success => "✓",
            Level::Error => "✗",
            Level::Info => "•",
        };
        format!("{mark} {notification}")
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let _ = writeln!(std::io::stderr().lock(), "{}", Self::render(&notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_marks_level() {
        assert_eq!(
            TerminalNotifier::render(&Notification::success("container started")),
            "✓ container started"
        );
        let failed = Notification::error("failed to stop the container", "boom");
        assert_eq!(TerminalNotifier::render(&failed), "✗ failed to stop the container: boom");
    }
}
