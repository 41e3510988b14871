use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::mode::{Difficulty, GameMode};
use crate::util::{mean, std_dev};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Classification {
    Correct,
    Wrong,
    TooEarly,
    RejectedTooFast,
    HellDeath,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Correct => "Correct",
            Classification::Wrong => "Wrong",
            Classification::TooEarly => "Too early",
            Classification::RejectedTooFast => "Too fast",
            Classification::HellDeath => "Dead",
        }
    }
}

/// Result of one round. A reaction time is carried iff the press was correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    round_index: u32,
    reaction_time_ms: Option<u64>,
    classification: Classification,
    points_awarded: u64,
}

impl RoundOutcome {
    pub fn correct(round_index: u32, reaction_time_ms: u64, points_awarded: u64) -> Self {
        Self {
            round_index,
            reaction_time_ms: Some(reaction_time_ms),
            classification: Classification::Correct,
            points_awarded,
        }
    }

    /// Any non-correct classification; a `Correct` here is downgraded to `Wrong`
    /// rather than producing an outcome without a reaction time.
    pub fn missed(round_index: u32, classification: Classification) -> Self {
        let classification = match classification {
            Classification::Correct => Classification::Wrong,
            other => other,
        };
        Self {
            round_index,
            reaction_time_ms: None,
            classification,
            points_awarded: 0,
        }
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn reaction_time_ms(&self) -> Option<u64> {
        self.reaction_time_ms
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn points_awarded(&self) -> u64 {
        self.points_awarded
    }

    pub fn is_correct(&self) -> bool {
        self.classification == Classification::Correct
    }
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    RoundsComplete,
    TimeUp,
    HellDeath,
    UserStopped,
}

/// End-of-session statistics handed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub reason: EndReason,
    pub score: u64,
    pub max_combo: u32,
    pub rounds_played: u32,
    pub total_attempts: usize,
    pub correct_count: usize,
    pub avg_reaction_time_ms: Option<u64>,
    pub best_reaction_time_ms: Option<u64>,
    pub std_dev_ms: Option<f64>,
    /// correct / total, in `[0, 1]`
    pub accuracy: f64,
}

impl SessionSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn from_outcomes(
        mode: GameMode,
        difficulty: Difficulty,
        reason: EndReason,
        score: u64,
        max_combo: u32,
        rounds_played: u32,
        outcomes: &[RoundOutcome],
    ) -> Self {
        let times: Vec<f64> = outcomes
            .iter()
            .filter_map(RoundOutcome::reaction_time_ms)
            .map(|t| t as f64)
            .collect();
        let correct_count = times.len();
        let total_attempts = outcomes.len();

        let accuracy = if total_attempts > 0 {
            correct_count as f64 / total_attempts as f64
        } else {
            0.0
        };

        let best_reaction_time_ms = outcomes
            .iter()
            .filter_map(RoundOutcome::reaction_time_ms)
            .min();

        Self {
            mode,
            difficulty,
            reason,
            score,
            max_combo,
            rounds_played,
            total_attempts,
            correct_count,
            avg_reaction_time_ms: mean(&times).map(|m| m.round() as u64),
            best_reaction_time_ms,
            std_dev_ms: std_dev(&times),
            accuracy,
        }
    }

    pub fn accuracy_pct(&self) -> f64 {
        (self.accuracy * 1_000.0).round() / 10.0
    }

    /// Per-classification tally, in first-seen order
    pub fn tally(outcomes: &[RoundOutcome]) -> Vec<(Classification, usize)> {
        outcomes
            .iter()
            .map(RoundOutcome::classification)
            .counts()
            .into_iter()
            .sorted_by_key(|(c, _)| {
                outcomes
                    .iter()
                    .position(|o| o.classification() == *c)
                    .unwrap_or(usize::MAX)
            })
            .collect()
    }
}

/// Leaderboard submission for a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub player_name: String,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub score: u64,
    pub avg_reaction_time_ms: f64,
    pub accuracy_pct: f64,
    pub max_combo: u32,
}

impl ScoreSubmission {
    pub fn from_summary(player_name: &str, summary: &SessionSummary) -> Self {
        Self {
            player_name: player_name.chars().take(50).collect(),
            mode: summary.mode,
            difficulty: summary.difficulty,
            score: summary.score,
            avg_reaction_time_ms: summary.avg_reaction_time_ms.unwrap_or(0) as f64,
            accuracy_pct: summary.accuracy_pct(),
            max_combo: summary.max_combo,
        }
    }
}

/// Where a submitted score landed in its mode's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub rank: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_time_present_iff_correct() {
        let hit = RoundOutcome::correct(1, 320, 680);
        assert!(hit.is_correct());
        assert_eq!(hit.reaction_time_ms(), Some(320));

        for c in [
            Classification::Wrong,
            Classification::TooEarly,
            Classification::RejectedTooFast,
            Classification::HellDeath,
        ] {
            let miss = RoundOutcome::missed(2, c);
            assert_eq!(miss.classification(), c);
            assert_eq!(miss.reaction_time_ms(), None);
            assert_eq!(miss.points_awarded(), 0);
        }
    }

    #[test]
    fn missed_never_yields_correct_without_time() {
        let o = RoundOutcome::missed(3, Classification::Correct);
        assert_eq!(o.classification(), Classification::Wrong);
        assert!(o.reaction_time_ms().is_none());
    }

    #[test]
    fn summary_statistics() {
        let outcomes = vec![
            RoundOutcome::correct(1, 300, 0),
            RoundOutcome::missed(2, Classification::Wrong),
            RoundOutcome::correct(3, 200, 0),
            RoundOutcome::missed(4, Classification::TooEarly),
        ];
        let s = SessionSummary::from_outcomes(
            GameMode::Endurance,
            Difficulty::Easy,
            EndReason::RoundsComplete,
            0,
            1,
            4,
            &outcomes,
        );
        assert_eq!(s.total_attempts, 4);
        assert_eq!(s.correct_count, 2);
        assert_eq!(s.avg_reaction_time_ms, Some(250));
        assert_eq!(s.best_reaction_time_ms, Some(200));
        assert_eq!(s.accuracy, 0.5);
        assert_eq!(s.accuracy_pct(), 50.0);
        assert_eq!(s.std_dev_ms, Some(50.0));
    }

    #[test]
    fn summary_of_nothing() {
        let s = SessionSummary::from_outcomes(
            GameMode::Unlimited,
            Difficulty::Hard,
            EndReason::UserStopped,
            0,
            0,
            0,
            &[],
        );
        assert_eq!(s.accuracy, 0.0);
        assert_eq!(s.avg_reaction_time_ms, None);
        assert_eq!(s.best_reaction_time_ms, None);
    }

    #[test]
    fn tally_keeps_first_seen_order() {
        let outcomes = vec![
            RoundOutcome::missed(1, Classification::TooEarly),
            RoundOutcome::correct(2, 400, 0),
            RoundOutcome::correct(3, 410, 0),
            RoundOutcome::missed(4, Classification::TooEarly),
        ];
        assert_eq!(
            SessionSummary::tally(&outcomes),
            vec![(Classification::TooEarly, 2), (Classification::Correct, 2)]
        );
    }

    #[test]
    fn submission_truncates_long_names() {
        let s = SessionSummary::from_outcomes(
            GameMode::TimeAttack,
            Difficulty::Hell,
            EndReason::TimeUp,
            1_234,
            4,
            6,
            &[RoundOutcome::correct(1, 250, 1_234)],
        );
        let name = "x".repeat(80);
        let sub = ScoreSubmission::from_summary(&name, &s);
        assert_eq!(sub.player_name.len(), 50);
        assert_eq!(sub.score, 1_234);
        assert_eq!(sub.accuracy_pct, 100.0);
        assert_eq!(sub.avg_reaction_time_ms, 250.0);
    }
}
