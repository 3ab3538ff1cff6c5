//! Domain models for Pocket Zoo.
//!
//! # Core Concepts
//!
//! ## Productivity
//!
//! - [`Task`]: A to-do item. Completing tasks and logging Pomodoro sessions
//!   against them is what earns coins.
//! - [`TaskFilters`]: Read-side predicate over the task list (theme, tags,
//!   urgency, task type). Never persisted.
//! - [`PomodoroTimer`]: Focus / break cycle. A finished focus interval adds a
//!   session to the selected task.
//!
//! ## Zoo
//!
//! - [`Animal`]: One of the six roster animals. Locked until bought, then cared
//!   for with coins. Stats decay over time; [`Mood`] and level are derived.
//! - [`GachaAnimal`]: Static catalog entry that can be pulled from a [`Pack`].
//! - [`CollectedAnimal`]: A pull the player has won.

mod animal;
mod filter;
mod gacha;
mod pomodoro;
mod task;

pub use animal::*;
pub use filter::*;
pub use gacha::*;
pub use pomodoro::*;
pub use task::*;

use serde::{Deserialize, Deserializer};

/// For `Option<Option<T>>` patch fields: absent stays `None` (via
/// `#[serde(default)]`), an explicit `null` becomes `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
