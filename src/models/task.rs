use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A to-do item tracked by the task store.
///
/// Ids are time-ordered UUIDv7 values, so sorting by id matches creation
/// order. `pomodoro_sessions` only ever goes up and `completed` never flips
/// back to `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub completed: bool,
    pub pomodoro_sessions: u32,
    pub created_at: DateTime<Utc>,
    /// Free-form grouping label ("Work", "Home", ...).
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub task_type: TaskType,
    /// Display-only countdown; nothing expires when it runs out.
    #[serde(default)]
    pub countdown_minutes: Option<u32>,
}

/// How urgent a task is. Filters call this "urgency".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Recurrence label of a task.
///
/// Recurrence is informational only: a completed daily task stays completed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Daily,
    Weekly,
    #[default]
    OneTime,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::OneTime => "one_time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "one_time" => Some(Self::OneTime),
            _ => None,
        }
    }
}

/// Input for creating a new task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Defaults to `Medium`.
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Defaults to `OneTime`.
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub countdown_minutes: Option<u32>,
}

/// Partial update for a task. Absent fields keep their value; `null` clears
/// the optional ones (`description`, `due_date`, `theme`, `countdown_minutes`).
///
/// Completion and session counts are deliberately absent: they move only
/// through `complete` and `increment_session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub theme: Option<Option<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub task_type: Option<TaskType>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub countdown_minutes: Option<Option<u32>>,
}

impl Task {
    /// Build a fresh task from user input, filling in defaults.
    pub fn new(input: CreateTaskInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            priority: input.priority.unwrap_or_default(),
            completed: false,
            pomodoro_sessions: 0,
            created_at: now,
            theme: input.theme,
            tags: input.tags,
            task_type: input.task_type.unwrap_or_default(),
            countdown_minutes: input.countdown_minutes,
        }
    }

    pub fn apply(&mut self, input: UpdateTaskInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(due_date) = input.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(theme) = input.theme {
            self.theme = theme;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(task_type) = input.task_type {
            self.task_type = task_type;
        }
        if let Some(countdown_minutes) = input.countdown_minutes {
            self.countdown_minutes = countdown_minutes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_has_defaults() {
        let task = Task::new(
            CreateTaskInput {
                title: "Write report".to_string(),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.task_type, TaskType::OneTime);
        assert!(!task.completed);
        assert_eq!(task.pomodoro_sessions, 0);
    }

    #[test]
    fn apply_keeps_unset_fields() {
        let mut task = Task::new(
            CreateTaskInput {
                title: "Old".to_string(),
                description: Some("keep me".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );

        task.apply(UpdateTaskInput {
            title: Some("New".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        });

        assert_eq!(task.title, "New");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.description.as_deref(), Some("keep me"));
    }

    #[test]
    fn null_clears_optional_fields() {
        let mut task = Task::new(
            CreateTaskInput {
                title: "Trip".to_string(),
                description: Some("pack bags".to_string()),
                theme: Some("Home".to_string()),
                countdown_minutes: Some(30),
                due_date: Some(Utc::now()),
                ..Default::default()
            },
            Utc::now(),
        );

        let input: UpdateTaskInput =
            serde_json::from_str(r#"{"description": null, "due_date": null, "theme": "Away"}"#)
                .unwrap();
        task.apply(input);

        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.theme.as_deref(), Some("Away"));
        assert_eq!(task.countdown_minutes, Some(30));
    }

    #[test]
    fn enum_strings_round_trip() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_str(p.as_str()), Some(p));
        }
        for t in [TaskType::Daily, TaskType::Weekly, TaskType::OneTime] {
            assert_eq!(TaskType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(Priority::from_str("urgent"), None);
    }
}
