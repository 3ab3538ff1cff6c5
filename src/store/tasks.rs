use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{encode, keys, read_json, LoadOutcome, SaveQueue, SaveTicket};
use crate::db::KeyValueStore;
use crate::models::*;

/// Owns the task list and the active filters.
///
/// Every mutation enqueues a snapshot of the whole task list. Unknown ids are
/// reported through the return value (`None` / `false`) and otherwise ignored.
/// Filters live in memory only.
pub struct TaskStore {
    tasks: Vec<Task>,
    filters: TaskFilters,
    queue: SaveQueue,
    pending: HashMap<&'static str, SaveTicket>,
    outcome: LoadOutcome,
}

impl TaskStore {
    /// An empty store that writes through `queue`.
    pub fn new(queue: SaveQueue) -> Self {
        Self {
            tasks: Vec::new(),
            filters: TaskFilters::default(),
            queue,
            pending: HashMap::new(),
            outcome: LoadOutcome::Fresh,
        }
    }

    /// Read the task list back from storage.
    ///
    /// A missing or undecodable blob leaves the store empty.
    pub fn load(kv: &dyn KeyValueStore, queue: SaveQueue) -> Self {
        let (tasks, outcome) = read_json::<Vec<Task>>(kv, keys::TASKS);
        let mut store = Self::new(queue);
        store.tasks = tasks.unwrap_or_default();
        store.outcome = outcome;
        tracing::info!(count = store.tasks.len(), ?outcome, "Loaded tasks");
        store
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filters(&self) -> &TaskFilters {
        &self.filters
    }

    /// Tasks passing every active filter, in list order.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| self.filters.matches(t))
            .collect()
    }

    pub fn incomplete_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| !t.completed).collect()
    }

    pub fn completed_count(&self) -> u64 {
        self.tasks.iter().filter(|t| t.completed).count() as u64
    }

    pub fn total_sessions(&self) -> u64 {
        self.tasks.iter().map(|t| t.pomodoro_sessions as u64).sum()
    }

    pub fn add(&mut self, input: CreateTaskInput) -> Task {
        let task = Task::new(input, Utc::now());
        tracing::debug!(id = %task.id, title = %task.title, "Task added");
        self.tasks.push(task.clone());
        self.persist();
        task
    }

    pub fn update(&mut self, id: Uuid, input: UpdateTaskInput) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.apply(input);
        let updated = task.clone();
        self.persist();
        Some(updated)
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Mark a task done. There is no way back.
    pub fn complete(&mut self, id: Uuid) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = true;
        let updated = task.clone();
        self.persist();
        Some(updated)
    }

    pub fn increment_session(&mut self, id: Uuid) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.pomodoro_sessions += 1;
        let updated = task.clone();
        self.persist();
        Some(updated)
    }

    pub fn apply_filters(&mut self, input: ApplyFiltersInput) -> &TaskFilters {
        self.filters.apply(input);
        &self.filters
    }

    pub fn reset_filters(&mut self) {
        self.filters = TaskFilters::default();
    }

    /// Tickets for the latest write of each key since the last call.
    pub fn take_save_tickets(&mut self) -> Vec<SaveTicket> {
        self.pending.drain().map(|(_, t)| t).collect()
    }

    fn persist(&mut self) {
        if let Some(json) = encode(keys::TASKS, &self.tasks) {
            let ticket = self.queue.enqueue(keys::TASKS, json);
            self.pending.insert(keys::TASKS, ticket);
        }
    }
}
