use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-tunable interval lengths.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// Every n-th finished focus interval is followed by a long break.
    pub pomodoros_until_long_break: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            pomodoros_until_long_break: 4,
        }
    }
}

/// Longest interval a user may configure: one day.
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

impl PomodoroSettings {
    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        let minutes = match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        };
        minutes.saturating_mul(60)
    }

    /// Every duration within `1..=MAX_INTERVAL_MINUTES` and a non-zero long break cadence.
    pub fn is_valid(&self) -> bool {
        let in_range = |m: u32| (1..=MAX_INTERVAL_MINUTES).contains(&m);
        in_range(self.focus_minutes)
            && in_range(self.short_break_minutes)
            && in_range(self.long_break_minutes)
            && self.pomodoros_until_long_break > 0
    }

    /// Pull every field back into the valid range.
    pub fn clamped(self) -> Self {
        let clamp = |m: u32| m.clamp(1, MAX_INTERVAL_MINUTES);
        Self {
            focus_minutes: clamp(self.focus_minutes),
            short_break_minutes: clamp(self.short_break_minutes),
            long_break_minutes: clamp(self.long_break_minutes),
            pomodoros_until_long_break: self.pomodoros_until_long_break.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Emitted when an interval runs out or is skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalEvent {
    /// A focus interval finished; `task_id` is the task it was spent on.
    FocusCompleted { task_id: Option<Uuid> },
    BreakCompleted,
}

/// Focus / break cycle.
///
/// The timer does not own a clock: callers drive it with [`tick`](Self::tick).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroTimer {
    pub settings: PomodoroSettings,
    pub mode: TimerMode,
    pub state: RunState,
    pub remaining_secs: u32,
    pub completed_pomodoros: u32,
    pub selected_task: Option<Uuid>,
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(PomodoroSettings::default())
    }
}

impl PomodoroTimer {
    pub fn new(settings: PomodoroSettings) -> Self {
        Self {
            settings,
            mode: TimerMode::Focus,
            state: RunState::Idle,
            remaining_secs: settings.seconds_for(TimerMode::Focus),
            completed_pomodoros: 0,
            selected_task: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != RunState::Idle
    }

    /// Start when idle, otherwise flip between running and paused.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            RunState::Idle | RunState::Paused => RunState::Running,
            RunState::Running => RunState::Paused,
        };
    }

    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.remaining_secs = self.settings.seconds_for(self.mode);
    }

    pub fn select_task(&mut self, task_id: Option<Uuid>) {
        self.selected_task = task_id;
    }

    /// Replace the settings. An idle timer picks up the new duration at once.
    pub fn set_settings(&mut self, settings: PomodoroSettings) {
        self.settings = settings;
        if self.state == RunState::Idle {
            self.remaining_secs = settings.seconds_for(self.mode);
        }
    }

    /// Finish the current interval early. Ignored unless the timer is active.
    pub fn skip(&mut self) -> Option<IntervalEvent> {
        if !self.is_active() {
            return None;
        }
        Some(self.complete_interval())
    }

    /// Advance a running timer by `seconds`.
    pub fn tick(&mut self, seconds: u32) -> Option<IntervalEvent> {
        if self.state != RunState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(seconds);
        if self.remaining_secs == 0 {
            Some(self.complete_interval())
        } else {
            None
        }
    }

    fn complete_interval(&mut self) -> IntervalEvent {
        let event = match self.mode {
            TimerMode::Focus => {
                self.completed_pomodoros += 1;
                let every = self.settings.pomodoros_until_long_break.max(1);
                self.mode = if self.completed_pomodoros % every == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                };
                IntervalEvent::FocusCompleted {
                    task_id: self.selected_task,
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                self.mode = TimerMode::Focus;
                IntervalEvent::BreakCompleted
            }
        };
        self.reset();
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_focus(timer: &mut PomodoroTimer) -> Option<IntervalEvent> {
        assert_eq!(timer.mode, TimerMode::Focus);
        timer.toggle();
        timer.tick(25 * 60)
    }

    #[test]
    fn starts_idle_with_focus_duration() {
        let timer = PomodoroTimer::default();
        assert_eq!(timer.state, RunState::Idle);
        assert_eq!(timer.remaining_secs, 1500);
    }

    #[test]
    fn toggle_cycles_running_and_paused() {
        let mut timer = PomodoroTimer::default();
        timer.toggle();
        assert_eq!(timer.state, RunState::Running);
        timer.toggle();
        assert_eq!(timer.state, RunState::Paused);
        assert_eq!(timer.tick(60), None);
        assert_eq!(timer.remaining_secs, 1500);
        timer.toggle();
        assert_eq!(timer.state, RunState::Running);
    }

    #[test]
    fn focus_completion_reports_selected_task() {
        let mut timer = PomodoroTimer::default();
        let task = Uuid::new_v4();
        timer.select_task(Some(task));

        let event = run_focus(&mut timer);

        assert_eq!(
            event,
            Some(IntervalEvent::FocusCompleted {
                task_id: Some(task)
            })
        );
        assert_eq!(timer.mode, TimerMode::ShortBreak);
        assert_eq!(timer.state, RunState::Idle);
        assert_eq!(timer.remaining_secs, 300);
    }

    #[test]
    fn fourth_focus_earns_long_break() {
        let mut timer = PomodoroTimer::default();
        for round in 1..=4 {
            run_focus(&mut timer);
            if round < 4 {
                assert_eq!(timer.mode, TimerMode::ShortBreak);
                timer.toggle();
                assert_eq!(timer.skip(), Some(IntervalEvent::BreakCompleted));
            }
        }
        assert_eq!(timer.mode, TimerMode::LongBreak);
        assert_eq!(timer.remaining_secs, 900);
        assert_eq!(timer.completed_pomodoros, 4);
    }

    #[test]
    fn skip_is_ignored_when_idle() {
        let mut timer = PomodoroTimer::default();
        assert_eq!(timer.skip(), None);
        assert_eq!(timer.mode, TimerMode::Focus);
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let settings = PomodoroSettings {
            focus_minutes: 80_000_000,
            ..Default::default()
        };
        assert!(!settings.is_valid());
        assert_eq!(settings.seconds_for(TimerMode::Focus), u32::MAX);

        let timer = PomodoroTimer::new(settings);
        assert_eq!(timer.remaining_secs, u32::MAX);
    }

    #[test]
    fn clamped_settings_are_valid() {
        let settings = PomodoroSettings {
            focus_minutes: 80_000_000,
            short_break_minutes: 0,
            long_break_minutes: 15,
            pomodoros_until_long_break: 0,
        }
        .clamped();

        assert!(settings.is_valid());
        assert_eq!(settings.focus_minutes, MAX_INTERVAL_MINUTES);
        assert_eq!(settings.short_break_minutes, 1);
        assert_eq!(settings.pomodoros_until_long_break, 1);
        assert!(PomodoroSettings::default().is_valid());
    }

    #[test]
    fn reset_restores_full_interval() {
        let mut timer = PomodoroTimer::default();
        timer.toggle();
        timer.tick(100);
        timer.reset();
        assert_eq!(timer.remaining_secs, 1500);
        assert!(!timer.is_active());
    }
}
