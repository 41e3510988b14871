use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    TimeAttack,
    Unlimited,
    Endurance,
}

impl GameMode {
    /// Pause between a resolved round and the next one
    pub fn cooldown_ms(&self) -> u64 {
        match self {
            GameMode::TimeAttack => 500,
            GameMode::Unlimited => 1_000,
            GameMode::Endurance => 2_000,
        }
    }

    pub fn awards_points(&self) -> bool {
        matches!(self, GameMode::TimeAttack)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameMode::TimeAttack => "Time Attack",
            GameMode::Unlimited => "Unlimited",
            GameMode::Endurance => "Endurance",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Hell,
}

/// Stimulus delay window and time-attack limit for one difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultySettings {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub time_limit_ms: u64,
}

impl Difficulty {
    pub fn settings(&self) -> DifficultySettings {
        match self {
            Difficulty::Easy => DifficultySettings {
                min_delay_ms: 2_000,
                max_delay_ms: 4_000,
                time_limit_ms: 60_000,
            },
            Difficulty::Medium => DifficultySettings {
                min_delay_ms: 1_000,
                max_delay_ms: 3_000,
                time_limit_ms: 45_000,
            },
            Difficulty::Hard => DifficultySettings {
                min_delay_ms: 500,
                max_delay_ms: 2_000,
                time_limit_ms: 30_000,
            },
            Difficulty::Hell => DifficultySettings {
                min_delay_ms: 200,
                max_delay_ms: 800,
                time_limit_ms: 30_000,
            },
        }
    }

    pub fn is_hell(&self) -> bool {
        matches!(self, Difficulty::Hell)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Hell => "Hell",
        }
    }
}
