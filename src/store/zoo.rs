use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{encode, keys, read_json, LoadOutcome, SaveQueue, SaveTicket};
use crate::db::KeyValueStore;
use crate::models::*;

/// Coins earned per completed task.
pub const COINS_PER_COMPLETED_TASK: u64 = 10;
/// Coins earned per finished Pomodoro session.
pub const COINS_PER_SESSION: u64 = 5;

/// How passive income is credited when the task list changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeMode {
    /// Credit only the growth of the earned total since the last award.
    #[default]
    Delta,
    /// Re-add the whole earned total on every change.
    Cumulative,
}

impl IncomeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delta => "delta",
            Self::Cumulative => "cumulative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "delta" => Some(Self::Delta),
            "cumulative" => Some(Self::Cumulative),
            _ => None,
        }
    }
}

/// `completed * 10 + sessions * 5`.
pub fn earned_total(completed_tasks: u64, sessions: u64) -> u64 {
    completed_tasks * COINS_PER_COMPLETED_TASK + sessions * COINS_PER_SESSION
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZooError {
    #[error("animal not found: {0}")]
    AnimalNotFound(String),

    #[error("pack not found: {0}")]
    PackNotFound(String),

    #[error("animal {0} is already unlocked")]
    AlreadyUnlocked(String),

    #[error("animal {0} is locked")]
    Locked(String),

    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error(transparent)]
    Gacha(#[from] GachaError),
}

/// Owns the animal roster, the coin balance and the gacha collection.
pub struct ZooStore {
    animals: Vec<Animal>,
    coins: u64,
    /// Earned total at the last income award, for delta crediting.
    baseline: u64,
    /// False when the stored baseline could not be read back.
    baseline_trusted: bool,
    collection: Vec<CollectedAnimal>,
    income_mode: IncomeMode,
    rng: StdRng,
    queue: SaveQueue,
    pending: HashMap<&'static str, SaveTicket>,
    outcome: LoadOutcome,
}

impl ZooStore {
    /// A brand-new zoo: full roster, all locked, no coins.
    pub fn new(queue: SaveQueue, income_mode: IncomeMode) -> Self {
        Self {
            animals: default_roster(),
            coins: 0,
            baseline: 0,
            baseline_trusted: true,
            collection: Vec::new(),
            income_mode,
            rng: StdRng::from_entropy(),
            queue,
            pending: HashMap::new(),
            outcome: LoadOutcome::Fresh,
        }
    }

    /// Read the zoo back from storage.
    ///
    /// An undecodable roster is reseeded from the catalog; other keys fall
    /// back to zero / empty individually.
    pub fn load(kv: &dyn KeyValueStore, queue: SaveQueue, income_mode: IncomeMode) -> Self {
        let mut store = Self::new(queue, income_mode);

        let (animals, animals_outcome) = read_json::<Vec<Animal>>(kv, keys::ANIMALS);
        let (coins, coins_outcome) = read_json::<u64>(kv, keys::COINS);
        let (baseline, baseline_outcome) = read_json::<u64>(kv, keys::COIN_BASELINE);
        let (collection, collection_outcome) =
            read_json::<Vec<CollectedAnimal>>(kv, keys::COLLECTION);

        if let Some(animals) = animals {
            store.animals = animals;
        }
        store.coins = coins.unwrap_or(0);
        store.baseline = baseline.unwrap_or(0);
        store.baseline_trusted = baseline_outcome == LoadOutcome::Restored;
        store.collection = collection.unwrap_or_default();
        store.outcome = animals_outcome
            .merge(coins_outcome)
            .merge(baseline_outcome)
            .merge(collection_outcome);

        tracing::info!(
            animals = store.animals.len(),
            coins = store.coins,
            outcome = ?store.outcome,
            "Loaded zoo"
        );
        store
    }

    /// Use a deterministic random source (tests, reproducible pulls).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    pub fn income_mode(&self) -> IncomeMode {
        self.income_mode
    }

    pub fn animals(&self) -> &[Animal] {
        &self.animals
    }

    pub fn get(&self, id: &str) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn collection(&self) -> &[CollectedAnimal] {
        &self.collection
    }

    /// Credit passive income for the current task totals.
    ///
    /// In delta mode a baseline that did not load cleanly is rebased onto the
    /// current total, crediting nothing. Returns the number of coins added.
    pub fn credit_income(&mut self, completed_tasks: u64, sessions: u64) -> u64 {
        let total = earned_total(completed_tasks, sessions);
        let credit = match self.income_mode {
            IncomeMode::Delta if !self.baseline_trusted => {
                tracing::warn!(
                    stored = self.baseline,
                    total,
                    "Coin baseline was not restored, rebasing without credit"
                );
                0
            }
            IncomeMode::Delta => total.saturating_sub(self.baseline),
            IncomeMode::Cumulative => total,
        };
        self.baseline_trusted = true;
        let baseline_moved = self.baseline != total;
        self.baseline = total;

        if credit > 0 {
            self.coins += credit;
            tracing::debug!(credit, coins = self.coins, "Income credited");
            self.persist_coins();
        }
        if baseline_moved {
            self.persist_baseline();
        }
        credit
    }

    pub fn unlock(&mut self, id: &str) -> Result<Animal, ZooError> {
        let coins = self.coins;
        let personality = Personality::random(&mut self.rng);
        let animal = self.find_mut(id)?;

        if animal.unlocked {
            return Err(ZooError::AlreadyUnlocked(id.to_string()));
        }
        if coins < animal.cost {
            return Err(ZooError::InsufficientCoins {
                needed: animal.cost,
                available: coins,
            });
        }

        animal.unlock(personality, Utc::now());
        let cost = animal.cost;
        let unlocked = animal.clone();

        self.coins -= cost;
        tracing::info!(id, cost, "Animal unlocked");
        self.persist_animals();
        self.persist_coins();
        Ok(unlocked)
    }

    pub fn feed(&mut self, id: &str) -> Result<Animal, ZooError> {
        self.care(id, CareAction::Feed)
    }

    pub fn play(&mut self, id: &str) -> Result<Animal, ZooError> {
        self.care(id, CareAction::Play)
    }

    pub fn clean(&mut self, id: &str) -> Result<Animal, ZooError> {
        self.care(id, CareAction::Clean)
    }

    pub fn rest(&mut self, id: &str) -> Result<Animal, ZooError> {
        self.care(id, CareAction::Rest)
    }

    pub fn pet(&mut self, id: &str) -> Result<Animal, ZooError> {
        self.care(id, CareAction::Pet)
    }

    /// Run a care action, charging its cost. Fails without side effects.
    pub fn care(&mut self, id: &str, action: CareAction) -> Result<Animal, ZooError> {
        let coins = self.coins;
        let cost = action.cost();
        let animal = self.find_mut(id)?;

        if !animal.unlocked {
            return Err(ZooError::Locked(id.to_string()));
        }
        if coins < cost {
            return Err(ZooError::InsufficientCoins {
                needed: cost,
                available: coins,
            });
        }

        animal.care(action, Utc::now());
        let cared = animal.clone();

        tracing::debug!(id, action = action.as_str(), cost, "Care action");
        self.persist_animals();
        if cost > 0 {
            self.coins -= cost;
            self.persist_coins();
        }
        Ok(cared)
    }

    /// Apply one decay step to every unlocked animal.
    pub fn decay_tick(&mut self) -> usize {
        self.decay_tick_at(Utc::now())
    }

    pub fn decay_tick_at(&mut self, now: DateTime<Utc>) -> usize {
        let mut ticked = 0;
        for animal in self.animals.iter_mut().filter(|a| a.unlocked) {
            animal.decay(now);
            ticked += 1;
        }
        if ticked > 0 {
            tracing::debug!(ticked, "Decay tick");
            self.persist_animals();
        }
        ticked
    }

    /// Buy a pack and pull one animal from it.
    ///
    /// Coins are only taken once the pull has produced an animal.
    pub fn buy_pack(&mut self, pack_id: &str) -> Result<CollectedAnimal, ZooError> {
        let pack = find_pack(pack_id).ok_or_else(|| ZooError::PackNotFound(pack_id.to_string()))?;
        if self.coins < pack.cost {
            return Err(ZooError::InsufficientCoins {
                needed: pack.cost,
                available: self.coins,
            });
        }

        let won = pull(pack.id, &mut self.rng)?;
        let collected = CollectedAnimal::new(won, Utc::now());

        self.coins -= pack.cost;
        self.collection.push(collected.clone());
        tracing::info!(pack = pack.id, animal = won.id, rarity = won.rarity.as_str(), "Pack opened");
        self.persist_coins();
        self.persist_collection();
        Ok(collected)
    }

    pub fn take_save_tickets(&mut self) -> Vec<SaveTicket> {
        self.pending.drain().map(|(_, t)| t).collect()
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Animal, ZooError> {
        self.animals
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ZooError::AnimalNotFound(id.to_string()))
    }

    fn persist_animals(&mut self) {
        if let Some(json) = encode(keys::ANIMALS, &self.animals) {
            self.enqueue(keys::ANIMALS, json);
        }
    }

    fn persist_coins(&mut self) {
        self.enqueue(keys::COINS, self.coins.to_string());
    }

    fn persist_baseline(&mut self) {
        self.enqueue(keys::COIN_BASELINE, self.baseline.to_string());
    }

    fn persist_collection(&mut self) {
        if let Some(json) = encode(keys::COLLECTION, &self.collection) {
            self.enqueue(keys::COLLECTION, json);
        }
    }

    fn enqueue(&mut self, key: &'static str, value: String) {
        let ticket = self.queue.enqueue(key, value);
        self.pending.insert(key, ticket);
    }
}
