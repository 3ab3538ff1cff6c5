//! In-memory state containers mirrored to the key-value store.
//!
//! Each store owns its data for the life of the process; the persisted copy
//! is a passive mirror written through the [`SaveQueue`] after every
//! mutation and read back once at startup.

mod app;
mod save_queue;
mod settings;
mod tasks;
mod zoo;

pub use app::*;
pub use save_queue::*;
pub use settings::*;
pub use tasks::*;
pub use zoo::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::KeyValueStore;

/// Fixed keys of the persisted blobs.
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const ANIMALS: &str = "animals";
    pub const COINS: &str = "coins";
    pub const COIN_BASELINE: &str = "coin_baseline";
    pub const COLLECTION: &str = "collection";
    pub const POMODORO_SETTINGS: &str = "pomodoro_settings";
    pub const ONBOARDING_COMPLETE: &str = "@onboarding_complete";
}

/// How a store came up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Nothing was stored yet; defaults were used.
    Fresh,
    /// State was read back from storage.
    Restored,
    /// Stored data could not be read or decoded; defaults were used instead.
    Reset,
}

impl LoadOutcome {
    /// Combine the outcomes of several keys belonging to one store.
    fn merge(self, other: LoadOutcome) -> LoadOutcome {
        use LoadOutcome::*;
        match (self, other) {
            (Reset, _) | (_, Reset) => Reset,
            (Restored, _) | (_, Restored) => Restored,
            _ => Fresh,
        }
    }
}

/// Read and decode one JSON blob, falling back to `None` on any failure.
fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> (Option<T>, LoadOutcome) {
    match kv.get(key) {
        Ok(None) => (None, LoadOutcome::Fresh),
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => (Some(value), LoadOutcome::Restored),
            Err(e) => {
                tracing::warn!(key, "Stored value is not decodable, resetting: {}", e);
                (None, LoadOutcome::Reset)
            }
        },
        Err(e) => {
            tracing::error!(key, "Failed to read stored value: {}", e);
            (None, LoadOutcome::Reset)
        }
    }
}

/// Serialize a snapshot for the save queue.
///
/// The stores only hold plain data, so encoding cannot fail in practice; if it
/// ever does the write is skipped and logged.
fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(key, "Failed to encode snapshot: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn merge_prefers_reset_then_restored() {
        use LoadOutcome::*;
        assert_eq!(Fresh.merge(Fresh), Fresh);
        assert_eq!(Fresh.merge(Restored), Restored);
        assert_eq!(Restored.merge(Reset), Reset);
    }

    #[test]
    fn read_json_distinguishes_missing_and_corrupt() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db.set("good", "[1,2]").unwrap();
        db.set("bad", "{not json").unwrap();

        let (missing, outcome) = read_json::<Vec<u32>>(&db, "missing");
        assert_eq!((missing, outcome), (None, LoadOutcome::Fresh));

        let (good, outcome) = read_json::<Vec<u32>>(&db, "good");
        assert_eq!((good, outcome), (Some(vec![1, 2]), LoadOutcome::Restored));

        let (bad, outcome) = read_json::<Vec<u32>>(&db, "bad");
        assert_eq!((bad, outcome), (None, LoadOutcome::Reset));
    }
}
