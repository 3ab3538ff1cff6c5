use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::task::{Priority, Task, TaskType};

/// Active filters over the task list.
///
/// Every set field must match (logical AND). A `None` field, or an empty tag
/// set, is a wildcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFilters {
    pub theme: Option<String>,
    /// A task matches when it carries at least one of these tags.
    pub tags: BTreeSet<String>,
    pub urgency: Option<Priority>,
    pub task_type: Option<TaskType>,
}

/// Partial filter change. Absent fields are left alone; `null` clears a
/// single filter and an empty tag list clears the tag filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyFiltersInput {
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub theme: Option<Option<String>>,
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Option<Priority>>,
    #[serde(default, deserialize_with = "super::nullable", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<Option<TaskType>>,
}

impl TaskFilters {
    pub fn apply(&mut self, input: ApplyFiltersInput) {
        if let Some(theme) = input.theme {
            self.theme = theme;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(urgency) = input.urgency {
            self.urgency = urgency;
        }
        if let Some(task_type) = input.task_type {
            self.task_type = task_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.tags.is_empty()
            && self.urgency.is_none()
            && self.task_type.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(theme) = &self.theme {
            if task.theme.as_ref() != Some(theme) {
                return false;
            }
        }
        if !self.tags.is_empty() && self.tags.is_disjoint(&task.tags) {
            return false;
        }
        if let Some(urgency) = self.urgency {
            if task.priority != urgency {
                return false;
            }
        }
        if let Some(task_type) = self.task_type {
            if task.task_type != task_type {
                return false;
            }
        }
        true
    }
}
