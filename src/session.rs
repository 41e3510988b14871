use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::collaborators::{Coach, Persistence, Presentation, PressSink};
use crate::mode::{Difficulty, GameMode};
use crate::outcome::{
    Classification, EndReason, RankInfo, RoundOutcome, ScoreSubmission, SessionSummary,
};
use crate::round::{
    IgnoreReason, Phase, PressResult, Resolution, RoundMachine, RoundRules, CHEAT_THRESHOLD_MS,
    DEBOUNCE_MS,
};
use crate::scheduler;
use crate::scoring;
use crate::timers::{TimerKind, TimerToken, Timers};

pub const WARM_UP_MS: u64 = 1_000;
pub const COUNTDOWN_STEP_MS: u64 = 1_000;
pub const HISTORY_CAP: usize = 20;
pub const DEFAULT_MAX_ROUNDS: u32 = 5;
pub const DEFAULT_BUTTON_COUNT: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub button_count: u8,
    /// Rounds in an endurance session
    pub max_rounds: u32,
    /// Leaderboard name; no name means scores are not submitted
    pub player_name: Option<String>,
    pub warm_up_ms: u64,
    pub cheat_threshold_ms: u64,
    pub debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            button_count: DEFAULT_BUTTON_COUNT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            player_name: None,
            warm_up_ms: WARM_UP_MS,
            cheat_threshold_ms: CHEAT_THRESHOLD_MS,
            debounce_ms: DEBOUNCE_MS,
        }
    }
}

/// Everything one session knows. Handed out read-only.
#[derive(Debug, Clone)]
pub struct SessionState {
    mode: GameMode,
    difficulty: Difficulty,
    round_index: u32,
    score: u64,
    combo: u32,
    max_combo: u32,
    time_remaining_ms: Option<u64>,
    best_reaction_time_ms: Option<u64>,
    outcomes: Vec<RoundOutcome>,
    history: Vec<RoundOutcome>,
    machine: RoundMachine,
    started: bool,
}

impl SessionState {
    fn fresh(
        mode: GameMode,
        difficulty: Difficulty,
        rules: RoundRules,
        history: Vec<RoundOutcome>,
        best_reaction_time_ms: Option<u64>,
    ) -> Self {
        Self {
            mode,
            difficulty,
            round_index: 0,
            score: 0,
            combo: 0,
            max_combo: 0,
            time_remaining_ms: None,
            best_reaction_time_ms,
            outcomes: Vec::new(),
            history,
            machine: RoundMachine::new(rules),
            started: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn time_remaining_ms(&self) -> Option<u64> {
        self.time_remaining_ms
    }

    pub fn best_reaction_time_ms(&self) -> Option<u64> {
        self.best_reaction_time_ms
    }

    /// This session's outcomes, oldest first
    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    /// Outcomes carried in from before this session (unlimited mode only)
    pub fn history(&self) -> &[RoundOutcome] {
        &self.history
    }

    /// Carried history followed by this session, capped to the rolling window
    pub fn recent(&self) -> Vec<RoundOutcome> {
        let all: Vec<RoundOutcome> = self
            .history
            .iter()
            .chain(self.outcomes.iter())
            .cloned()
            .collect();
        let skip = all.len().saturating_sub(HISTORY_CAP);
        all.into_iter().skip(skip).collect()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn armed_target(&self) -> Option<u8> {
        self.machine.armed().map(|a| a.target_button)
    }

    pub fn is_over(&self) -> bool {
        self.started && self.machine.phase() == Phase::Terminated
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.classification() == classification)
            .count()
    }
}

/// Drives the round loop: starts rounds, scores them, decides when to stop.
pub struct GameSession<P: Presentation> {
    config: SessionConfig,
    state: SessionState,
    timers: Timers,
    rng: StdRng,
    presentation: P,
    persistence: Option<Box<dyn Persistence>>,
    coaches: Vec<Box<dyn Coach>>,
    carried_best: Option<u64>,
    summary: Option<SessionSummary>,
    last_rank: Option<RankInfo>,
}

impl<P: Presentation> GameSession<P> {
    pub fn new(config: SessionConfig, presentation: P) -> Self {
        let rules = Self::rules_for(&config, Difficulty::Easy);
        Self {
            config,
            state: SessionState::fresh(
                GameMode::TimeAttack,
                Difficulty::Easy,
                rules,
                Vec::new(),
                None,
            ),
            timers: Timers::new(),
            rng: StdRng::from_entropy(),
            presentation,
            persistence: None,
            coaches: Vec::new(),
            carried_best: None,
            summary: None,
            last_rank: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_persistence(mut self, persistence: Box<dyn Persistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_coach(mut self, coach: Box<dyn Coach>) -> Self {
        self.coaches.push(coach);
        self
    }

    /// Seed the rolling history and best time from stored attempts
    pub fn with_history(mut self, history: Vec<RoundOutcome>) -> Self {
        let skip = history.len().saturating_sub(HISTORY_CAP);
        let history: Vec<RoundOutcome> = history.into_iter().skip(skip).collect();
        self.carried_best = history
            .iter()
            .filter_map(RoundOutcome::reaction_time_ms)
            .min();
        self.state.best_reaction_time_ms = self.carried_best;
        self.state.history = history;
        self
    }

    fn rules_for(config: &SessionConfig, difficulty: Difficulty) -> RoundRules {
        RoundRules {
            cheat_threshold_ms: config.cheat_threshold_ms,
            debounce_ms: config.debounce_ms,
            hell: difficulty.is_hell(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn last_rank(&self) -> Option<RankInfo> {
        self.last_rank
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn is_timer_pending(&self, kind: TimerKind) -> bool {
        self.timers.is_pending(kind)
    }

    /// Reset everything and schedule the first round after the warm-up
    pub fn start_session(&mut self, mode: GameMode, difficulty: Difficulty, now_ms: u64) {
        self.timers.cancel_all();

        let previous = std::mem::take(&mut self.state.outcomes);
        let mut history = std::mem::take(&mut self.state.history);
        let history = match mode {
            GameMode::Unlimited => {
                history.extend(previous);
                let skip = history.len().saturating_sub(HISTORY_CAP);
                history.into_iter().skip(skip).collect()
            }
            GameMode::TimeAttack | GameMode::Endurance => Vec::new(),
        };

        let rules = Self::rules_for(&self.config, difficulty);
        self.state = SessionState::fresh(mode, difficulty, rules, history, self.carried_best);
        self.state.started = true;
        self.summary = None;
        self.last_rank = None;

        if mode == GameMode::TimeAttack {
            self.state.time_remaining_ms = Some(difficulty.settings().time_limit_ms);
            self.timers
                .schedule(TimerKind::Countdown, now_ms + COUNTDOWN_STEP_MS);
        }
        self.timers
            .schedule(TimerKind::WarmUp, now_ms + self.config.warm_up_ms);

        info!("Session started: {} on {}", mode, difficulty);
        self.presentation.clear_stimulus();
        self.presentation.report_status(&format!(
            "{} on {}: get ready...",
            mode.label(),
            difficulty.label()
        ));
    }

    /// Fire every deadline that has come due by `now_ms`
    pub fn tick(&mut self, now_ms: u64) {
        while let Some(token) = self.timers.pop_due(now_ms) {
            self.dispatch(token, now_ms);
        }
    }

    /// Fire one timer handed out earlier; stale tokens are dropped
    pub fn on_timer(&mut self, token: TimerToken, now_ms: u64) {
        match self.timers.take_if_current(token) {
            Some(token) => self.dispatch(token, now_ms),
            None => debug!("Stale {:?} timer ignored", token.kind),
        }
    }

    fn dispatch(&mut self, token: TimerToken, now_ms: u64) {
        match token.kind {
            TimerKind::WarmUp | TimerKind::Cooldown => self.next_round(token.due_ms),
            TimerKind::Arm => self.arm_round(now_ms),
            TimerKind::Countdown => self.countdown_tick(token.due_ms),
        }
    }

    fn time_is_up(&self) -> bool {
        self.state.mode == GameMode::TimeAttack && self.state.time_remaining_ms == Some(0)
    }

    fn next_round(&mut self, now_ms: u64) {
        if !self.state.started || self.state.phase() == Phase::Terminated {
            return;
        }
        self.state.machine.finish_cooldown();

        if self.state.mode == GameMode::Endurance
            && self.state.round_index >= self.config.max_rounds
        {
            self.end_session(now_ms, EndReason::RoundsComplete);
            return;
        }
        if self.time_is_up() {
            return;
        }

        let round_index = self.state.round_index + 1;
        let target = self.rng.gen_range(1..=self.config.button_count.max(1));
        if !self.state.machine.begin_round(round_index, target) {
            return;
        }
        self.state.round_index = round_index;

        let delay = scheduler::next_delay(
            &mut self.rng,
            self.state.mode,
            self.state.difficulty,
            self.state.time_remaining_ms,
        );
        self.timers.schedule(TimerKind::Arm, now_ms + delay);
        debug!("Round {} scheduled in {}ms", round_index, delay);

        self.presentation.clear_stimulus();
        self.presentation.report_status("Wait for the glow...");
    }

    fn arm_round(&mut self, now_ms: u64) {
        if self.time_is_up() {
            return;
        }
        if let Some(armed) = self.state.machine.arm(now_ms) {
            self.presentation.show_stimulus(armed.target_button);
            self.presentation
                .report_status(&format!("Press button {}!", armed.target_button));
        }
    }

    fn countdown_tick(&mut self, due_ms: u64) {
        let Some(remaining) = self.state.time_remaining_ms else {
            return;
        };
        let remaining = remaining.saturating_sub(COUNTDOWN_STEP_MS);
        self.state.time_remaining_ms = Some(remaining);

        if remaining == 0 {
            self.end_session(due_ms, EndReason::TimeUp);
        } else {
            self.timers
                .schedule(TimerKind::Countdown, due_ms + COUNTDOWN_STEP_MS);
        }
    }

    fn resolve(&mut self, resolution: Resolution, timestamp_ms: u64) {
        let round_index = self.state.round_index;
        let (outcome, status) = match (resolution.classification, resolution.reaction_time_ms) {
            (Classification::Correct, Some(reaction_ms)) => {
                self.score_hit(round_index, reaction_ms)
            }
            (classification, _) => {
                if matches!(classification, Classification::Wrong | Classification::TooEarly) {
                    self.state.combo = 0;
                }
                let status = self.miss_status(&resolution);
                (RoundOutcome::missed(round_index, classification), status)
            }
        };

        self.state.outcomes.push(outcome.clone());
        self.presentation.clear_stimulus();
        self.presentation.report_round_outcome(&outcome);
        self.presentation.report_status(&status);

        if let Some(persistence) = self.persistence.as_mut() {
            if let Err(e) = persistence.append_outcome(&outcome) {
                warn!("Failed to store attempt: {}", e);
                self.presentation.report_status("Failed to save attempt");
            }
        }

        let recent = self.state.recent();
        for coach in self.coaches.iter_mut() {
            if let Some(message) = coach.on_round(&recent, self.state.best_reaction_time_ms) {
                self.presentation.report_coaching(&message);
            }
        }

        if outcome.classification() == Classification::HellDeath {
            self.end_session(timestamp_ms, EndReason::HellDeath);
        } else {
            self.timers.schedule(
                TimerKind::Cooldown,
                timestamp_ms + self.state.mode.cooldown_ms(),
            );
        }
    }

    fn score_hit(&mut self, round_index: u32, reaction_ms: u64) -> (RoundOutcome, String) {
        let state = &mut self.state;
        state.combo += 1;
        state.max_combo = state.max_combo.max(state.combo);

        let points = scoring::points_for_mode(state.mode, reaction_ms, state.combo);
        state.score += points;

        let new_record = state.best_reaction_time_ms.map_or(true, |b| reaction_ms < b);
        if new_record {
            state.best_reaction_time_ms = Some(reaction_ms);
        }

        let status = if state.mode.awards_points() {
            format!("+{} pts! {}ms ({}x combo)", points, reaction_ms, state.combo)
        } else if new_record {
            format!("Correct! {} ms. NEW RECORD!", reaction_ms)
        } else {
            format!("Correct! {} ms", reaction_ms)
        };

        (RoundOutcome::correct(round_index, reaction_ms, points), status)
    }

    fn miss_status(&self, resolution: &Resolution) -> String {
        match resolution.classification {
            Classification::TooEarly => "Too early! Wait for the glow.".to_string(),
            Classification::RejectedTooFast => format!(
                "Too fast ({}ms)! Press rejected.",
                resolution.measured_ms.unwrap_or_default()
            ),
            Classification::HellDeath => format!(
                "Wrong button. Hell claims you after {} rounds!",
                self.state.round_index.saturating_sub(1)
            ),
            _ => {
                let needed = resolution
                    .target_button
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string());
                if self.state.mode.awards_points() {
                    format!("Wrong! Combo broken! (needed {})", needed)
                } else {
                    format!(
                        "Wrong! Pressed {}, needed {}",
                        resolution.pressed_button, needed
                    )
                }
            }
        }
    }

    /// User-initiated end of the session
    pub fn stop(&mut self, now_ms: u64) {
        if self.state.started && self.state.phase() != Phase::Terminated {
            self.end_session(now_ms, EndReason::UserStopped);
        }
    }

    fn end_session(&mut self, now_ms: u64, reason: EndReason) {
        if self.summary.is_some() {
            return;
        }
        self.timers.cancel_all();
        self.state.machine.terminate();

        let state = &self.state;
        let summary = SessionSummary::from_outcomes(
            state.mode,
            state.difficulty,
            reason,
            state.score,
            state.max_combo,
            state.round_index,
            &state.outcomes,
        );
        self.carried_best = match (self.carried_best, summary.best_reaction_time_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        info!(
            "Session ended at {}ms ({}): score {}, {}/{} correct, max combo {}",
            now_ms,
            reason,
            summary.score,
            summary.correct_count,
            summary.total_attempts,
            summary.max_combo
        );

        self.presentation.clear_stimulus();
        self.presentation.report_summary(&summary);
        self.presentation.report_status(&end_status(&summary));

        if let (Some(persistence), Some(name)) =
            (self.persistence.as_mut(), self.config.player_name.as_deref())
        {
            if summary.total_attempts > 0 {
                let submission = ScoreSubmission::from_summary(name, &summary);
                match persistence.submit_session_summary(&submission) {
                    Ok(rank) => {
                        self.last_rank = Some(rank);
                        self.presentation.report_status(&format!(
                            "{} ranked #{} of {}",
                            submission.player_name, rank.rank, rank.total
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to submit score: {}", e);
                        self.presentation.report_status("Failed to save score");
                    }
                }
            }
        }

        let recent = self.state.recent();
        for coach in self.coaches.iter_mut() {
            if let Some(message) = coach.on_session_end(&recent, &summary) {
                self.presentation.report_coaching(&message);
            }
        }

        self.summary = Some(summary);
    }
}

fn end_status(summary: &SessionSummary) -> String {
    let avg = summary
        .avg_reaction_time_ms
        .map_or_else(|| "-".to_string(), |a| a.to_string());
    match summary.reason {
        EndReason::TimeUp => format!(
            "Time's up! Final score: {} points (max combo {}x)",
            summary.score, summary.max_combo
        ),
        EndReason::RoundsComplete => format!(
            "Game complete! Avg: {}ms | Accuracy: {:.1}%",
            avg,
            summary.accuracy_pct()
        ),
        EndReason::HellDeath => format!(
            "Game over! Survived {} rounds in Hell",
            summary.rounds_played.saturating_sub(1)
        ),
        EndReason::UserStopped => format!(
            "Session stopped. Avg: {}ms | Accuracy: {:.1}%",
            avg,
            summary.accuracy_pct()
        ),
    }
}

impl<P: Presentation> PressSink for GameSession<P> {
    fn press(&mut self, button: u8, timestamp_ms: u64) {
        if button == 0 || button > self.config.button_count {
            debug!("Button {} is not on the board", button);
            return;
        }

        match self.state.machine.press(button, timestamp_ms) {
            PressResult::Resolved(resolution) => {
                self.timers.cancel(TimerKind::Arm);
                self.resolve(resolution, timestamp_ms);
            }
            PressResult::Ignored(IgnoreReason::NotArmed)
                if self.state.started && self.state.phase() == Phase::Idle =>
            {
                self.presentation
                    .report_status("Wait for the button to glow!");
            }
            PressResult::Ignored(reason) => {
                debug!("Button {} ignored: {:?}", button, reason);
            }
        }
    }
}
