use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{
    IncomeMode, LoadOutcome, SaveError, SaveQueue, SaveTicket, SettingsStore, TaskStore, ZooStore,
};
use crate::config::Config;
use crate::db::KeyValueStore;
use crate::models::*;
use crate::notify::{self, LogNotifier, Notifier};

/// Everything the app holds in memory.
///
/// Task mutations go through here rather than straight to the [`TaskStore`]
/// so that passive income and reminders follow every change of the list.
pub struct AppState {
    tasks: TaskStore,
    zoo: ZooStore,
    settings: SettingsStore,
    timer: PomodoroTimer,
    notifier: Arc<dyn Notifier>,
}

/// Headline numbers for the home screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub coins: u64,
    pub total_tasks: usize,
    pub completed_tasks: u64,
    pub pomodoro_sessions: u64,
    pub unlocked_animals: usize,
    pub collected_animals: usize,
}

/// How each store came up at startup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadReport {
    pub tasks: LoadOutcome,
    pub zoo: LoadOutcome,
    pub settings: LoadOutcome,
}

impl AppState {
    pub fn new(
        tasks: TaskStore,
        zoo: ZooStore,
        settings: SettingsStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let timer = PomodoroTimer::new(settings.pomodoro());
        let mut state = Self {
            tasks,
            zoo,
            settings,
            timer,
            notifier,
        };
        state.sync_income();
        state
    }

    /// Restore every store from `kv`, writing back through `queue`.
    pub fn load(
        kv: &dyn KeyValueStore,
        queue: SaveQueue,
        config: &Config,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tasks = TaskStore::load(kv, queue.clone());
        let zoo = ZooStore::load(kv, queue.clone(), config.income_mode);
        let settings = SettingsStore::load(kv, queue);
        Self::new(tasks, zoo, settings, notifier)
    }

    /// A state that is never persisted.
    pub fn in_memory(income_mode: IncomeMode) -> Self {
        let queue = SaveQueue::disconnected();
        Self::new(
            TaskStore::new(queue.clone()),
            ZooStore::new(queue.clone(), income_mode),
            SettingsStore::new(queue),
            Arc::new(LogNotifier),
        )
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn zoo(&self) -> &ZooStore {
        &self.zoo
    }

    /// Zoo actions never touch the task list, so direct access is fine.
    pub fn zoo_mut(&mut self) -> &mut ZooStore {
        &mut self.zoo
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn timer(&self) -> &PomodoroTimer {
        &self.timer
    }

    pub fn load_report(&self) -> LoadReport {
        LoadReport {
            tasks: self.tasks.load_outcome(),
            zoo: self.zoo.load_outcome(),
            settings: self.settings.load_outcome(),
        }
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn add_task(&mut self, input: CreateTaskInput) -> Task {
        let task = self.tasks.add(input);
        self.schedule_reminder(&task);
        self.sync_income();
        task
    }

    pub fn update_task(&mut self, id: Uuid, input: UpdateTaskInput) -> Option<Task> {
        let due_changed = input.due_date.is_some();
        let task = self.tasks.update(id, input)?;
        if due_changed {
            self.schedule_reminder(&task);
        }
        self.sync_income();
        Some(task)
    }

    pub fn delete_task(&mut self, id: Uuid) -> bool {
        if !self.tasks.delete(id) {
            return false;
        }
        if self.timer.selected_task == Some(id) {
            self.timer.select_task(None);
        }
        self.sync_income();
        true
    }

    pub fn complete_task(&mut self, id: Uuid) -> Option<Task> {
        let task = self.tasks.complete(id)?;
        self.sync_income();
        Some(task)
    }

    pub fn increment_session(&mut self, id: Uuid) -> Option<Task> {
        let task = self.tasks.increment_session(id)?;
        self.sync_income();
        Some(task)
    }

    pub fn apply_filters(&mut self, input: ApplyFiltersInput) -> TaskFilters {
        self.tasks.apply_filters(input).clone()
    }

    pub fn reset_filters(&mut self) {
        self.tasks.reset_filters();
    }

    // ============================================================
    // Pomodoro
    // ============================================================

    /// Choose which task focus time counts towards. Completed or unknown tasks
    /// are refused.
    pub fn select_task(&mut self, task_id: Option<Uuid>) -> bool {
        if let Some(id) = task_id {
            match self.tasks.get(id) {
                Some(task) if !task.completed => {}
                _ => return false,
            }
        }
        self.timer.select_task(task_id);
        true
    }

    pub fn toggle_timer(&mut self) {
        self.timer.toggle();
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    pub fn skip_timer(&mut self) -> Option<IntervalEvent> {
        let event = self.timer.skip()?;
        self.on_interval(event);
        Some(event)
    }

    pub fn tick_timer(&mut self, seconds: u32) -> Option<IntervalEvent> {
        let event = self.timer.tick(seconds)?;
        self.on_interval(event);
        Some(event)
    }

    /// Apply new interval lengths; out-of-range values are clamped.
    pub fn set_pomodoro_settings(&mut self, settings: PomodoroSettings) -> PomodoroSettings {
        let settings = settings.clamped();
        self.timer.set_settings(settings);
        self.settings.set_pomodoro(settings);
        settings
    }

    pub fn mark_onboarding_complete(&mut self) {
        self.settings.mark_onboarding_complete();
    }

    pub fn summary(&self) -> Summary {
        Summary {
            coins: self.zoo.coins(),
            total_tasks: self.tasks.tasks().len(),
            completed_tasks: self.tasks.completed_count(),
            pomodoro_sessions: self.tasks.total_sessions(),
            unlocked_animals: self.zoo.animals().iter().filter(|a| a.unlocked).count(),
            collected_animals: self.zoo.collection().len(),
        }
    }

    pub fn take_save_tickets(&mut self) -> Vec<SaveTicket> {
        let mut tickets = self.tasks.take_save_tickets();
        tickets.extend(self.zoo.take_save_tickets());
        tickets.extend(self.settings.take_save_tickets());
        tickets
    }

    fn on_interval(&mut self, event: IntervalEvent) {
        let IntervalEvent::FocusCompleted { task_id } = event else {
            return;
        };
        let title = match task_id.and_then(|id| self.increment_session(id)) {
            Some(task) => task.title,
            None => "your focus session".to_string(),
        };
        self.notifier.deliver(notify::pomodoro_complete(&title));
    }

    fn schedule_reminder(&self, task: &Task) {
        if let Some(reminder) = notify::task_reminder(task, Utc::now()) {
            self.notifier.deliver(reminder);
        }
    }

    fn sync_income(&mut self) {
        self.zoo
            .credit_income(self.tasks.completed_count(), self.tasks.total_sessions());
    }
}

/// Shared handle to the app state.
#[derive(Clone)]
pub struct App {
    state: Arc<Mutex<AppState>>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().expect("app state lock poisoned")
    }

    /// Wait until the latest snapshot of every store has been written.
    ///
    /// Returns the first failure, after waiting for all of them.
    pub async fn flush(&self) -> Result<(), SaveError> {
        let tickets = self.lock().take_save_tickets();
        let mut first_err = None;
        for ticket in tickets {
            if let Err(e) = ticket.wait().await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Run the stat decay tick every `every` until the handle is aborted.
    pub fn spawn_decay_loop(&self, every: Duration) -> JoinHandle<()> {
        let app = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let ticked = app.lock().zoo_mut().decay_tick();
                tracing::debug!(ticked, "Decay loop tick");
            }
        })
    }

    /// Drive the Pomodoro timer from the wall clock, one second at a time.
    pub fn spawn_pomodoro_clock(&self) -> JoinHandle<()> {
        let app = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            loop {
                interval.tick().await;
                let event = app.lock().tick_timer(1);
                if let Some(event) = event {
                    tracing::info!(?event, "Pomodoro interval finished");
                }
            }
        })
    }
}
