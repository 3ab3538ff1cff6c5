use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

/// Coin price of each paid care action.
pub const FEED_COST: u64 = 5;
pub const PLAY_COST: u64 = 3;
pub const CLEAN_COST: u64 = 4;

/// A roster animal living in the player's zoo.
///
/// The roster is fixed (see [`default_roster`]); animals are never deleted and
/// once unlocked they stay unlocked. `mood` and `level` are cached values
/// derived from `stats` and `age_days` by [`Animal::refresh_derived`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Animal {
    pub id: String,
    pub name: String,
    pub cost: u64,
    pub unlocked: bool,
    pub stats: Stats,
    pub age_days: u32,
    pub last_interaction: Option<DateTime<Utc>>,
    pub last_fed: Option<DateTime<Utc>>,
    pub last_played: Option<DateTime<Utc>>,
    pub last_cleaned: Option<DateTime<Utc>>,
    pub last_slept: Option<DateTime<Utc>>,
    pub mood: Mood,
    pub level: u32,
    /// Assigned on unlock.
    #[serde(default)]
    pub personality: Option<Personality>,
}

/// The five care stats. Every field stays within `STAT_MIN..=STAT_MAX`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    pub hunger: i32,
    pub energy: i32,
    pub happiness: i32,
    pub hygiene: i32,
    pub health: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            hunger: STAT_MAX,
            energy: STAT_MAX,
            happiness: STAT_MAX,
            hygiene: STAT_MAX,
            health: STAT_MAX,
        }
    }
}

impl Stats {
    pub fn average(&self) -> i32 {
        (self.hunger + self.energy + self.happiness + self.hygiene + self.health) / 5
    }

    pub fn is_within_bounds(&self) -> bool {
        [
            self.hunger,
            self.energy,
            self.happiness,
            self.hygiene,
            self.health,
        ]
        .iter()
        .all(|v| (STAT_MIN..=STAT_MAX).contains(v))
    }
}

/// Add `delta` to a stat and clamp the result into range.
pub fn adjust(stat: &mut i32, delta: i32) {
    *stat = (*stat + delta).clamp(STAT_MIN, STAT_MAX);
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Hungry,
    Sad,
    Angry,
    Happy,
    #[default]
    Innocent,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hungry => "hungry",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Happy => "happy",
            Self::Innocent => "innocent",
        }
    }
}

/// Derive a mood from stats. First matching rule wins.
pub fn derive_mood(stats: &Stats) -> Mood {
    if stats.hunger < 20 {
        Mood::Hungry
    } else if stats.energy < 20 || stats.happiness < 30 {
        Mood::Sad
    } else if stats.hygiene < 30 {
        Mood::Angry
    } else if stats.health < 30 {
        Mood::Sad
    } else if stats.happiness > 80 && stats.hunger > 80 {
        Mood::Happy
    } else {
        Mood::Innocent
    }
}

/// `max(1, age/5 + average/20)` using whole-number division.
pub fn derive_level(age_days: u32, stats: &Stats) -> u32 {
    let from_stats = (stats.average().max(0) / 20) as u32;
    (age_days / 5 + from_stats).max(1)
}

/// Character trait rolled when an animal is unlocked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Personality {
    Playful,
    Shy,
    Lazy,
    Energetic,
    Curious,
    Grumpy,
    Friendly,
}

/// What the animal is doing, for picking a dialog line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Pet,
    Play,
    Idle,
    Sleeping,
}

impl Personality {
    pub const ALL: [Personality; 7] = [
        Self::Playful,
        Self::Shy,
        Self::Lazy,
        Self::Energetic,
        Self::Curious,
        Self::Grumpy,
        Self::Friendly,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Self::Friendly)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Playful => "🎉",
            Self::Shy => "😳",
            Self::Lazy => "😴",
            Self::Energetic => "⚡️",
            Self::Curious => "🔍",
            Self::Grumpy => "😠",
            Self::Friendly => "😊",
        }
    }

    pub fn line(&self, activity: Activity) -> &'static str {
        use Activity::*;
        match (self, activity) {
            (Self::Playful, Pet) => "Yay! That tickles! 🐾",
            (Self::Playful, Play) => "Wanna play tag?",
            (Self::Playful, Idle) => "Bouncing around with joy!",
            (Self::Playful, Sleeping) => "Dreaming of jumping fences...",
            (Self::Shy, Pet) => "Oh... okay... 🫣",
            (Self::Shy, Play) => "Maybe just a little?",
            (Self::Shy, Idle) => "Hiding in a corner...",
            (Self::Shy, Sleeping) => "Snug and hidden away.",
            (Self::Lazy, Pet) => "Zzz... that was nice.",
            (Self::Lazy, Play) => "Ugh... maybe later.",
            (Self::Lazy, Idle) => "Still lying down...",
            (Self::Lazy, Sleeping) => "Snoring happily 💤",
            (Self::Energetic, Pet) => "Let's go! Let's run!",
            (Self::Energetic, Play) => "Zoom zoom! 🏃",
            (Self::Energetic, Idle) => "Can't stay still!",
            (Self::Energetic, Sleeping) => "Power napping for action!",
            (Self::Curious, Pet) => "What's that? What's this?",
            (Self::Curious, Play) => "Let's explore!",
            (Self::Curious, Idle) => "Sniffing around...",
            (Self::Curious, Sleeping) => "Dreaming of new things...",
            (Self::Grumpy, Pet) => "Hmmph. Fine.",
            (Self::Grumpy, Play) => "I guess so...",
            (Self::Grumpy, Idle) => "Growling slightly.",
            (Self::Grumpy, Sleeping) => "Grumbling in sleep.",
            (Self::Friendly, Pet) => "You're the best 🥰",
            (Self::Friendly, Play) => "Let's play together!",
            (Self::Friendly, Idle) => "Waving at you!",
            (Self::Friendly, Sleeping) => "Cuddling plushies 🧸",
        }
    }
}

/// A care action a player can take on an unlocked animal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CareAction {
    Feed,
    Play,
    Clean,
    Rest,
    Pet,
}

impl CareAction {
    pub fn cost(&self) -> u64 {
        match self {
            Self::Feed => FEED_COST,
            Self::Play => PLAY_COST,
            Self::Clean => CLEAN_COST,
            Self::Rest | Self::Pet => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Clean => "clean",
            Self::Rest => "rest",
            Self::Pet => "pet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "feed" => Some(Self::Feed),
            "play" => Some(Self::Play),
            "clean" => Some(Self::Clean),
            "rest" => Some(Self::Rest),
            "pet" => Some(Self::Pet),
            _ => None,
        }
    }
}

impl Animal {
    fn seed(id: &str, name: &str, cost: u64) -> Self {
        let stats = Stats::default();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            cost,
            unlocked: false,
            stats,
            age_days: 0,
            last_interaction: None,
            last_fed: None,
            last_played: None,
            last_cleaned: None,
            last_slept: None,
            mood: derive_mood(&stats),
            level: derive_level(0, &stats),
            personality: None,
        }
    }

    /// Mark the animal unlocked and stamp every care timestamp.
    pub fn unlock(&mut self, personality: Personality, now: DateTime<Utc>) {
        self.unlocked = true;
        self.personality = Some(personality);
        self.last_interaction = Some(now);
        self.last_fed = Some(now);
        self.last_played = Some(now);
        self.last_cleaned = Some(now);
        self.last_slept = Some(now);
    }

    /// Apply the stat effects of a care action. Coins are handled by the caller.
    pub fn care(&mut self, action: CareAction, now: DateTime<Utc>) {
        let s = &mut self.stats;
        match action {
            CareAction::Feed => {
                adjust(&mut s.hunger, 30);
                adjust(&mut s.health, 5);
                self.last_fed = Some(now);
            }
            CareAction::Play => {
                adjust(&mut s.happiness, 30);
                adjust(&mut s.energy, -10);
                adjust(&mut s.hunger, -10);
                self.last_played = Some(now);
            }
            CareAction::Clean => {
                s.hygiene = STAT_MAX;
                adjust(&mut s.happiness, 10);
                self.last_cleaned = Some(now);
            }
            CareAction::Rest => {
                s.energy = STAT_MAX;
                adjust(&mut s.health, 10);
                self.last_slept = Some(now);
            }
            CareAction::Pet => {
                adjust(&mut s.happiness, 15);
            }
        }
        self.last_interaction = Some(now);

        // A fed animal is always shown as happy until the next refresh.
        self.mood = match action {
            CareAction::Feed => Mood::Happy,
            _ => derive_mood(&self.stats),
        };
        self.level = derive_level(self.age_days, &self.stats);
    }

    /// One decay step based on time since the last interaction.
    ///
    /// Locked animals and animals never interacted with are left alone.
    pub fn decay(&mut self, now: DateTime<Utc>) {
        if !self.unlocked {
            return;
        }
        let Some(last) = self.last_interaction else {
            return;
        };

        let elapsed = now.signed_duration_since(last);
        let hours = elapsed.num_seconds() as f64 / 3600.0;
        let s = &mut self.stats;

        if hours > 2.0 {
            adjust(&mut s.hunger, -5);
        }
        if hours > 3.0 {
            adjust(&mut s.energy, -3);
        }
        if hours > 4.0 {
            adjust(&mut s.happiness, -4);
        }
        if hours > 8.0 {
            adjust(&mut s.hygiene, -5);
        }

        if s.hunger < 30 || s.energy < 20 || s.hygiene < 30 {
            adjust(&mut s.health, -3);
        } else if s.happiness > 80 && s.hunger > 80 && s.energy > 80 {
            adjust(&mut s.health, 1);
        }

        let days = elapsed.num_days().max(0) as u32;
        self.age_days = self.age_days.max(days);
        self.refresh_derived();
    }

    pub fn refresh_derived(&mut self) {
        self.mood = derive_mood(&self.stats);
        self.level = derive_level(self.age_days, &self.stats);
    }

    /// What the animal says right now.
    pub fn dialog(&self, activity: Activity) -> &'static str {
        self.personality
            .map(|p| p.line(activity))
            .unwrap_or("Just hanging out...")
    }
}

/// The six animals every new zoo starts with, all locked.
pub fn default_roster() -> Vec<Animal> {
    vec![
        Animal::seed("1", "Rabbit", 50),
        Animal::seed("2", "Turtle", 100),
        Animal::seed("3", "Fox", 150),
        Animal::seed("4", "Owl", 200),
        Animal::seed("5", "Lion", 300),
        Animal::seed("6", "Elephant", 400),
    ]
}
