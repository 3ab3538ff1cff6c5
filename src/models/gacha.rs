use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rarity tier of a gacha animal, in roll order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Legendary,
    Epic,
}

impl Rarity {
    /// Tiers in the order the roll walks them.
    pub const ROLL_ORDER: [Rarity; 4] = [
        Self::Common,
        Self::Uncommon,
        Self::Legendary,
        Self::Epic,
    ];

    pub fn probability(&self) -> f64 {
        match self {
            Self::Common => 0.95,
            Self::Uncommon => 0.04,
            Self::Legendary => 0.009,
            Self::Epic => 0.001,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Legendary => "legendary",
            Self::Epic => "epic",
        }
    }
}

/// A purchasable box of random animals.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pack {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: u64,
}

/// A catalog entry that can come out of a pack.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GachaAnimal {
    pub id: &'static str,
    pub name: &'static str,
    pub pack: &'static str,
    pub rarity: Rarity,
}

pub const PACKS: &[Pack] = &[
    Pack {
        id: "rodent",
        name: "Rodent Pack",
        cost: 100,
    },
    Pack {
        id: "farm",
        name: "Farm Pack",
        cost: 150,
    },
    Pack {
        id: "premium",
        name: "Mythical Pack",
        cost: 500,
    },
];

pub const GACHA_ANIMALS: &[GachaAnimal] = &[
    GachaAnimal {
        id: "rat",
        name: "Rat",
        pack: "rodent",
        rarity: Rarity::Common,
    },
    GachaAnimal {
        id: "hamster",
        name: "Hamster",
        pack: "rodent",
        rarity: Rarity::Uncommon,
    },
    GachaAnimal {
        id: "cow",
        name: "Cow",
        pack: "farm",
        rarity: Rarity::Common,
    },
    GachaAnimal {
        id: "dragon",
        name: "Dragon",
        pack: "premium",
        rarity: Rarity::Legendary,
    },
    GachaAnimal {
        id: "phoenix",
        name: "Phoenix",
        pack: "premium",
        rarity: Rarity::Epic,
    },
];

pub fn find_pack(id: &str) -> Option<&'static Pack> {
    PACKS.iter().find(|p| p.id == id)
}

/// A pull the player has won and keeps in their collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectedAnimal {
    pub animal_id: String,
    pub name: String,
    pub pack: String,
    pub rarity: Rarity,
    pub pulled_at: DateTime<Utc>,
}

impl CollectedAnimal {
    pub fn new(animal: &GachaAnimal, now: DateTime<Utc>) -> Self {
        Self {
            animal_id: animal.id.to_string(),
            name: animal.name.to_string(),
            pack: animal.pack.to_string(),
            rarity: animal.rarity,
            pulled_at: now,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GachaError {
    #[error("pack '{0}' has no {1:?} or common animals to pull")]
    EmptyPool(String, Rarity),
}

/// Map a roll in `[0, 1)` to a rarity tier.
///
/// Walks the tiers accumulating probability; the result is the last tier
/// whose preceding cumulative threshold the roll exceeded.
pub fn select_rarity(roll: f64) -> Rarity {
    let mut selected = Rarity::ROLL_ORDER[0];
    let mut cumulative = 0.0;
    for window in Rarity::ROLL_ORDER.windows(2) {
        cumulative += window[0].probability();
        if roll > cumulative {
            selected = window[1];
        }
    }
    selected
}

/// Pull one animal from `pack_id`.
///
/// A rarity the pack does not stock falls back to the pack's commons. Only a
/// pack with neither is an error.
pub fn pull<R: Rng + ?Sized>(
    pack_id: &str,
    rng: &mut R,
) -> Result<&'static GachaAnimal, GachaError> {
    pull_from(GACHA_ANIMALS, pack_id, rng)
}

pub fn pull_from<'a, R: Rng + ?Sized>(
    catalog: &'a [GachaAnimal],
    pack_id: &str,
    rng: &mut R,
) -> Result<&'a GachaAnimal, GachaError> {
    let rarity = select_rarity(rng.gen::<f64>());

    let pool_of = |wanted: Rarity| -> Vec<&'a GachaAnimal> {
        catalog
            .iter()
            .filter(|a| a.pack == pack_id && a.rarity == wanted)
            .collect()
    };

    let mut pool = pool_of(rarity);
    if pool.is_empty() {
        pool = pool_of(Rarity::Common);
    }

    pool.choose(rng)
        .copied()
        .ok_or_else(|| GachaError::EmptyPool(pack_id.to_string(), rarity))
}

/// Packs whose commons are missing, so some rolls cannot be served.
pub fn packs_without_commons() -> Vec<&'static str> {
    PACKS
        .iter()
        .filter(|p| {
            !GACHA_ANIMALS
                .iter()
                .any(|a| a.pack == p.id && a.rarity == Rarity::Common)
        })
        .map(|p| p.id)
        .collect()
}
