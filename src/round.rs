use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::outcome::Classification;

/// Presses faster than this after the stimulus are not humanly plausible
pub const CHEAT_THRESHOLD_MS: u64 = 100;

/// Presses closer than this to the last accepted press are duplicates
pub const DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Phase {
    Idle,
    Scheduled,
    Armed,
    Resolved,
    Terminated,
}

/// The live stimulus: which button glows and when it started glowing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedRound {
    pub target_button: u8,
    pub armed_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRules {
    pub cheat_threshold_ms: u64,
    pub debounce_ms: u64,
    /// A wrong press ends the whole session
    pub hell: bool,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            cheat_threshold_ms: CHEAT_THRESHOLD_MS,
            debounce_ms: DEBOUNCE_MS,
            hell: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Debounced,
    /// A previous press is still being resolved
    Locked,
    /// Nothing is scheduled or armed
    NotArmed,
    Terminated,
}

/// How a press settled the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub classification: Classification,
    pub reaction_time_ms: Option<u64>,
    pub target_button: Option<u8>,
    pub pressed_button: u8,
    /// Measured time for a rejected too-fast press, for user feedback only
    pub measured_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressResult {
    Ignored(IgnoreReason),
    Resolved(Resolution),
}

/// Lifecycle of a single round.
///
/// `Idle -> Scheduled -> Armed -> Resolved -> Idle`, with `Terminated`
/// reachable from anywhere. Calls that don't fit the current phase are
/// no-ops and report so through their return value.
#[derive(Debug, Clone)]
pub struct RoundMachine {
    rules: RoundRules,
    phase: Phase,
    round_index: u32,
    pending_target: Option<u8>,
    armed: Option<ArmedRound>,
    last_accepted_press_ms: Option<u64>,
    locked: bool,
}

impl RoundMachine {
    pub fn new(rules: RoundRules) -> Self {
        Self {
            rules,
            phase: Phase::Idle,
            round_index: 0,
            pending_target: None,
            armed: None,
            last_accepted_press_ms: None,
            locked: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn armed(&self) -> Option<ArmedRound> {
        self.armed
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Idle -> Scheduled. The target stays hidden until `arm`.
    pub fn begin_round(&mut self, round_index: u32, target_button: u8) -> bool {
        if self.phase != Phase::Idle {
            debug!("begin_round ignored in phase {}", self.phase);
            return false;
        }
        self.phase = Phase::Scheduled;
        self.round_index = round_index;
        self.pending_target = Some(target_button);
        self.armed = None;
        self.locked = false;
        true
    }

    /// Scheduled -> Armed, stamping the moment the stimulus shows
    pub fn arm(&mut self, now_ms: u64) -> Option<ArmedRound> {
        if self.phase != Phase::Scheduled {
            debug!("arm ignored in phase {}", self.phase);
            return None;
        }
        let target_button = self.pending_target.take()?;
        let armed = ArmedRound {
            target_button,
            armed_at_ms: now_ms,
        };
        self.armed = Some(armed);
        self.phase = Phase::Armed;
        Some(armed)
    }

    pub fn press(&mut self, button: u8, timestamp_ms: u64) -> PressResult {
        if self.phase == Phase::Terminated {
            return PressResult::Ignored(IgnoreReason::Terminated);
        }

        if let Some(last) = self.last_accepted_press_ms {
            if timestamp_ms.saturating_sub(last) < self.rules.debounce_ms {
                debug!(
                    "button {} debounced ({}ms after previous)",
                    button,
                    timestamp_ms.saturating_sub(last)
                );
                return PressResult::Ignored(IgnoreReason::Debounced);
            }
        }
        self.last_accepted_press_ms = Some(timestamp_ms);

        if self.locked {
            debug!("button {} dropped, previous press still resolving", button);
            return PressResult::Ignored(IgnoreReason::Locked);
        }

        match self.phase {
            Phase::Scheduled => {
                self.pending_target = None;
                self.phase = Phase::Resolved;
                self.locked = true;
                PressResult::Resolved(Resolution {
                    classification: Classification::TooEarly,
                    reaction_time_ms: None,
                    target_button: None,
                    pressed_button: button,
                    measured_ms: None,
                })
            }
            Phase::Armed => {
                let Some(armed) = self.armed.take() else {
                    // armed phase without a stimulus, nothing to resolve
                    self.phase = Phase::Idle;
                    return PressResult::Ignored(IgnoreReason::NotArmed);
                };
                self.phase = Phase::Resolved;
                self.locked = true;
                PressResult::Resolved(self.classify(armed, button, timestamp_ms))
            }
            Phase::Idle | Phase::Resolved | Phase::Terminated => {
                PressResult::Ignored(IgnoreReason::NotArmed)
            }
        }
    }

    fn classify(&self, armed: ArmedRound, button: u8, timestamp_ms: u64) -> Resolution {
        let reaction = timestamp_ms.saturating_sub(armed.armed_at_ms);
        let (classification, reaction_time_ms, measured_ms) = if button == armed.target_button {
            if reaction < self.rules.cheat_threshold_ms {
                (Classification::RejectedTooFast, None, Some(reaction))
            } else {
                (Classification::Correct, Some(reaction), None)
            }
        } else if self.rules.hell {
            (Classification::HellDeath, None, None)
        } else {
            (Classification::Wrong, None, None)
        };

        Resolution {
            classification,
            reaction_time_ms,
            target_button: Some(armed.target_button),
            pressed_button: button,
            measured_ms,
        }
    }

    /// Resolved -> Idle once the cooldown has elapsed
    pub fn finish_cooldown(&mut self) -> bool {
        if self.phase != Phase::Resolved {
            return false;
        }
        self.phase = Phase::Idle;
        true
    }

    pub fn terminate(&mut self) {
        self.phase = Phase::Terminated;
        self.pending_target = None;
        self.armed = None;
        self.locked = false;
    }
}
