//! Deadline slots for the cooperative game loop.
//!
//! Each kind of timer has at most one pending deadline. Scheduling a kind
//! replaces its previous deadline, cancelling is idempotent, and every
//! scheduled deadline carries a fresh generation so a token handed out
//! earlier can be recognised as stale after a cancel or reschedule.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Pause after `start_session` before the first round
    WarmUp,
    /// Stimulus becomes visible
    Arm,
    /// Pause after a resolved round
    Cooldown,
    /// One-second time-attack countdown
    Countdown,
}

impl TimerKind {
    const ALL: [TimerKind; 4] = [
        TimerKind::WarmUp,
        TimerKind::Arm,
        TimerKind::Cooldown,
        TimerKind::Countdown,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::WarmUp => 0,
            TimerKind::Arm => 1,
            TimerKind::Cooldown => 2,
            TimerKind::Countdown => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
    pub due_ms: u64,
}

#[derive(Debug, Default)]
pub struct Timers {
    slots: [Option<TimerToken>; 4],
    generation: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, due_ms: u64) -> TimerToken {
        self.generation += 1;
        let token = TimerToken {
            kind,
            generation: self.generation,
            due_ms,
        };
        self.slots[kind.slot()] = Some(token);
        token
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slots[kind.slot()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None; 4];
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn is_current(&self, token: TimerToken) -> bool {
        self.slots[token.kind.slot()] == Some(token)
    }

    /// Remove and return `token` if it is still the live deadline for its kind
    pub fn take_if_current(&mut self, token: TimerToken) -> Option<TimerToken> {
        if self.is_current(token) {
            self.slots[token.kind.slot()].take()
        } else {
            None
        }
    }

    /// Earliest deadline at or before `now_ms`, removed from its slot.
    /// Ties fire in `WarmUp, Arm, Cooldown, Countdown` order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<TimerToken> {
        let next = TimerKind::ALL
            .iter()
            .filter_map(|k| self.slots[k.slot()])
            .filter(|t| t.due_ms <= now_ms)
            .min_by_key(|t| (t.due_ms, t.kind.slot()))?;
        self.slots[next.kind.slot()].take()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|t| t.due_ms).min()
    }
}
