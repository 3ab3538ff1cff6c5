//! Local notifications.
//!
//! Delivery belongs to the platform; this crate only decides *when* to notify
//! and *what* to say, then hands off to a [`Notifier`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::models::Task;

/// How far ahead of a due date the reminder fires.
pub const REMINDER_LEAD_MINUTES: i64 = 60;

/// A notification ready to hand to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// `None` means deliver immediately.
    pub at: Option<DateTime<Utc>>,
}

pub trait Notifier: Send + Sync {
    fn deliver(&self, notification: Notification);
}

/// When to remind about a task due at `due`, if that moment is still ahead.
pub fn reminder_time(due: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let at = due - Duration::minutes(REMINDER_LEAD_MINUTES);
    (at > now).then_some(at)
}

pub fn task_reminder(task: &Task, now: DateTime<Utc>) -> Option<Notification> {
    let at = reminder_time(task.due_date?, now)?;
    Some(Notification {
        title: format!("Reminder: {}", task.title),
        body: task
            .description
            .clone()
            .unwrap_or_else(|| "You have a task coming up!".to_string()),
        at: Some(at),
    })
}

pub fn pomodoro_complete(task_title: &str) -> Notification {
    Notification {
        title: "🎉 Pomodoro Complete!".to_string(),
        body: format!("Great job focusing on \"{}\"!", task_title),
        at: None,
    }
}

/// Writes notifications to the log instead of a device.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: Notification) {
        match notification.at {
            Some(at) => tracing::info!(
                at = %at,
                "Scheduled notification: {} - {}",
                notification.title,
                notification.body
            ),
            None => tracing::info!(
                "Notification: {} - {}",
                notification.title,
                notification.body
            ),
        }
    }
}

/// Keeps every delivered notification; handy for tests and inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, notification: Notification) {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateTaskInput;

    #[test]
    fn reminder_is_one_hour_before_due() {
        let now = Utc::now();
        let due = now + Duration::hours(3);
        assert_eq!(reminder_time(due, now), Some(due - Duration::hours(1)));
    }

    #[test]
    fn no_reminder_when_lead_time_has_passed() {
        let now = Utc::now();
        assert_eq!(reminder_time(now + Duration::minutes(30), now), None);
        assert_eq!(reminder_time(now - Duration::hours(2), now), None);
    }

    #[test]
    fn task_reminder_uses_description_or_default() {
        let now = Utc::now();
        let task = Task::new(
            CreateTaskInput {
                title: "Dentist".to_string(),
                due_date: Some(now + Duration::days(1)),
                ..Default::default()
            },
            now,
        );

        let reminder = task_reminder(&task, now).expect("due tomorrow");
        assert_eq!(reminder.title, "Reminder: Dentist");
        assert_eq!(reminder.body, "You have a task coming up!");
    }
}
