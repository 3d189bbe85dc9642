//! Status change notifications
//!
//! When a task's status changes, the reporter is notified. The sink is a
//! mock email: the message is formatted and emitted through the log. The
//! trait seam lets tests capture notifications.

use crate::models::Task;

/// Notification sink for task status changes.
pub trait Notifier: Send + Sync {
    /// Called after a task's status has changed.
    fn task_status_changed(&self, task: &Task);
}

/// Notifier that formats the mock email and writes it to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn task_status_changed(&self, task: &Task) {
        tracing::info!(
            "Sending email to {}: The status of task '{}' has been changed to `{}`.",
            task.reporter,
            task.title,
            task.status
        );
    }
}
