//! Seams between the game core and everything around it.
//!
//! The core calls into these after each transition. None of them can write
//! back into session state, and their failures never stop the round loop.

use crate::error::Result;
use crate::outcome::{RankInfo, RoundOutcome, ScoreSubmission, SessionSummary};

pub trait Presentation {
    fn show_stimulus(&mut self, target_button: u8);
    fn clear_stimulus(&mut self);
    fn report_status(&mut self, text: &str);
    fn report_round_outcome(&mut self, outcome: &RoundOutcome);
    fn report_summary(&mut self, _summary: &SessionSummary) {}
    fn report_coaching(&mut self, _message: &str) {}
}

pub trait Persistence {
    /// Add to the rolling local attempt history
    fn append_outcome(&mut self, outcome: &RoundOutcome) -> Result<()>;
    /// Record a finished session on the leaderboard
    fn submit_session_summary(&mut self, submission: &ScoreSubmission) -> Result<RankInfo>;
}

/// Advisory listener; anything it returns is shown, never acted on
pub trait Coach {
    fn on_round(&mut self, recent: &[RoundOutcome], best_ms: Option<u64>) -> Option<String>;
    fn on_session_end(&mut self, recent: &[RoundOutcome], summary: &SessionSummary)
        -> Option<String>;
}

/// Single entry point every input origin funnels into
pub trait PressSink {
    fn press(&mut self, button: u8, timestamp_ms: u64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Stimulus(u8),
    Cleared,
    Status(String),
    Outcome(RoundOutcome),
    Summary(SessionSummary),
    Coaching(String),
}

/// Presentation that keeps everything it is told, for headless runs
#[derive(Debug, Default, Clone)]
pub struct RecordingPresentation {
    pub events: Vec<PresentationEvent>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Status(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses().last().copied()
    }

    pub fn stimuli(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Stimulus(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<&SessionSummary> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::Summary(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl Presentation for RecordingPresentation {
    fn show_stimulus(&mut self, target_button: u8) {
        self.events.push(PresentationEvent::Stimulus(target_button));
    }

    fn clear_stimulus(&mut self) {
        self.events.push(PresentationEvent::Cleared);
    }

    fn report_status(&mut self, text: &str) {
        self.events.push(PresentationEvent::Status(text.to_string()));
    }

    fn report_round_outcome(&mut self, outcome: &RoundOutcome) {
        self.events.push(PresentationEvent::Outcome(outcome.clone()));
    }

    fn report_summary(&mut self, summary: &SessionSummary) {
        self.events.push(PresentationEvent::Summary(summary.clone()));
    }

    fn report_coaching(&mut self, message: &str) {
        self.events
            .push(PresentationEvent::Coaching(message.to_string()));
    }
}
