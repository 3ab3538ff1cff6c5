use std::collections::HashMap;

use super::{encode, keys, read_json, LoadOutcome, SaveQueue, SaveTicket};
use crate::db::KeyValueStore;
use crate::models::PomodoroSettings;

/// Small persisted preferences: onboarding flag and timer lengths.
pub struct SettingsStore {
    onboarding_complete: bool,
    pomodoro: PomodoroSettings,
    queue: SaveQueue,
    pending: HashMap<&'static str, SaveTicket>,
    outcome: LoadOutcome,
}

impl SettingsStore {
    pub fn new(queue: SaveQueue) -> Self {
        Self {
            onboarding_complete: false,
            pomodoro: PomodoroSettings::default(),
            queue,
            pending: HashMap::new(),
            outcome: LoadOutcome::Fresh,
        }
    }

    pub fn load(kv: &dyn KeyValueStore, queue: SaveQueue) -> Self {
        let mut store = Self::new(queue);

        let (onboarding, onboarding_outcome) = read_json::<bool>(kv, keys::ONBOARDING_COMPLETE);
        let (pomodoro, pomodoro_outcome) =
            read_json::<PomodoroSettings>(kv, keys::POMODORO_SETTINGS);

        store.onboarding_complete = onboarding.unwrap_or(false);
        store.pomodoro = match pomodoro {
            Some(saved) if !saved.is_valid() => {
                tracing::warn!(?saved, "Stored Pomodoro settings out of range, clamping");
                saved.clamped()
            }
            Some(saved) => saved,
            None => PomodoroSettings::default(),
        };
        store.outcome = onboarding_outcome.merge(pomodoro_outcome);
        tracing::info!(
            onboarding_complete = store.onboarding_complete,
            outcome = ?store.outcome,
            "Loaded settings"
        );
        store
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    pub fn onboarding_complete(&self) -> bool {
        self.onboarding_complete
    }

    pub fn mark_onboarding_complete(&mut self) {
        if !self.onboarding_complete {
            self.onboarding_complete = true;
            let ticket = self.queue.enqueue(keys::ONBOARDING_COMPLETE, "true".to_string());
            self.pending.insert(keys::ONBOARDING_COMPLETE, ticket);
        }
    }

    pub fn pomodoro(&self) -> PomodoroSettings {
        self.pomodoro
    }

    pub fn set_pomodoro(&mut self, settings: PomodoroSettings) {
        self.pomodoro = settings;
        if let Some(json) = encode(keys::POMODORO_SETTINGS, &settings) {
            let ticket = self.queue.enqueue(keys::POMODORO_SETTINGS, json);
            self.pending.insert(keys::POMODORO_SETTINGS, ticket);
        }
    }

    pub fn take_save_tickets(&mut self) -> Vec<SaveTicket> {
        self.pending.drain().map(|(_, t)| t).collect()
    }
}
