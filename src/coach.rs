use crate::collaborators::Coach;
use crate::mode::GameMode;
use crate::outcome::{Classification, RoundOutcome, SessionSummary};
use crate::util::{mean, variance};

const WINDOW: usize = 10;
const CONSISTENCY_WINDOW: usize = 5;

/// Rule-based advice from recent attempts
#[derive(Debug, Default, Clone)]
pub struct MiniCoach;

impl MiniCoach {
    pub fn new() -> Self {
        Self
    }

    /// `best_ms` is the best time known so far, including this round
    pub fn advise(recent: &[RoundOutcome], best_ms: Option<u64>) -> Option<String> {
        if recent.is_empty() {
            return None;
        }
        let window = &recent[recent.len().saturating_sub(WINDOW)..];
        let wrong = window
            .iter()
            .filter(|o| o.classification() == Classification::Wrong)
            .count();
        let times: Vec<u64> = window
            .iter()
            .filter_map(RoundOutcome::reaction_time_ms)
            .collect();

        let Some(&last) = times.last() else {
            return Some("Take your time to get the first correct response!".to_string());
        };
        if wrong >= 4 {
            return Some(
                "Slow down and focus on accuracy first. Speed comes with practice.".to_string(),
            );
        }

        let as_f64: Vec<f64> = times.iter().map(|&t| t as f64).collect();
        let recent_avg = mean(&as_f64).unwrap_or_default();

        let mut message = None;
        if times.len() >= 2 {
            let previous = times[times.len() - 2] as i64;
            let improvement = previous - last as i64;
            message = if improvement > 50 {
                Some(format!(
                    "Massive improvement! {}ms faster than last time!",
                    improvement
                ))
            } else if improvement > 20 {
                Some(format!("Getting faster! You improved by {}ms!", improvement))
            } else if improvement < -30 {
                Some("Take a breath and focus. Consistency is key!".to_string())
            } else {
                None
            };
        }

        let mut message = message.unwrap_or_else(|| tier_message(recent_avg).to_string());

        if as_f64.len() >= CONSISTENCY_WINDOW {
            let tail = &as_f64[as_f64.len() - CONSISTENCY_WINDOW..];
            if variance(tail).unwrap_or_default() > 15_000.0 && recent_avg < 400.0 {
                message = "You're fast but inconsistent. Try to find your rhythm!".to_string();
            }
        }

        if best_ms == Some(last) && last < 300 {
            message = "NEW PERSONAL RECORD! That was lightning fast!".to_string();
        }

        Some(message)
    }

    pub fn wrap_up(summary: &SessionSummary) -> Option<String> {
        let message = match summary.mode {
            GameMode::TimeAttack => match summary.score {
                s if s > 1_000 => "Outstanding performance! You're a time attack master!",
                s if s > 500 => "Great job! Your reflexes are sharp!",
                s if s > 200 => "Good work! Keep practicing to improve your score!",
                _ => "Nice try! Focus on accuracy and speed will follow!",
            },
            GameMode::Unlimited | GameMode::Endurance => match summary.best_reaction_time_ms? {
                b if b < 300 => "Outstanding reflexes! You're in the top tier!",
                b if b < 400 => "Great performance! Keep practicing!",
                _ => "Good work! Regular practice will improve your times!",
            },
        };
        Some(message.to_string())
    }
}

fn tier_message(avg_ms: f64) -> &'static str {
    if avg_ms < 250.0 {
        "Elite reflexes! You're in the top 1%!"
    } else if avg_ms < 350.0 {
        "Excellent reflexes! Keep this pace up!"
    } else if avg_ms < 450.0 {
        "Good reaction time! Practice makes perfect!"
    } else if avg_ms < 600.0 {
        "Getting there! Focus on anticipating the glow."
    } else {
        "Relax and stay focused. Speed will come naturally!"
    }
}

impl Coach for MiniCoach {
    fn on_round(&mut self, recent: &[RoundOutcome], best_ms: Option<u64>) -> Option<String> {
        Self::advise(recent, best_ms)
    }

    fn on_session_end(
        &mut self,
        _recent: &[RoundOutcome],
        summary: &SessionSummary,
    ) -> Option<String> {
        Self::wrap_up(summary)
    }
}
