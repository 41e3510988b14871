// End-to-end round lifecycle scenarios driven with a hand-moved clock.
// No terminal involved: the session reports into a RecordingPresentation.

use glowtap::clock::{Clock, ManualClock};
use glowtap::collaborators::RecordingPresentation;
use glowtap::round::Phase;
use glowtap::scheduler;
use glowtap::stats::ReactionDb;
use glowtap::{
    Classification, Difficulty, EndReason, GameMode, GameSession, PressSink, SessionConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Harness {
    session: GameSession<RecordingPresentation>,
    clock: ManualClock,
}

impl Harness {
    fn start(mode: GameMode, difficulty: Difficulty) -> Self {
        Self::with_session(
            GameSession::new(SessionConfig::default(), RecordingPresentation::new()).with_seed(11),
            mode,
            difficulty,
        )
    }

    fn with_session(
        mut session: GameSession<RecordingPresentation>,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> Self {
        let clock = ManualClock::starting_at(0);
        session.start_session(mode, difficulty, clock.now_ms());
        Self { session, clock }
    }

    fn advance(&mut self, ms: u64) {
        let now = self.clock.advance(ms);
        self.session.tick(now);
    }

    fn wait_for(&mut self, phase: Phase) {
        for _ in 0..10_000 {
            if self.session.state().phase() == phase {
                return;
            }
            self.advance(10);
        }
        panic!("never reached {phase}");
    }

    /// Tick until a button glows and return it
    fn wait_for_glow(&mut self) -> u8 {
        self.wait_for(Phase::Armed);
        self.session
            .state()
            .armed_target()
            .expect("armed round has a target")
    }

    fn press_after(&mut self, button: u8, ms: u64) {
        let ts = self.clock.advance(ms);
        self.session.press(button, ts);
    }

    fn hit(&mut self, reaction_ms: u64) {
        let target = self.wait_for_glow();
        self.press_after(target, reaction_ms);
    }

    fn miss(&mut self) {
        let target = self.wait_for_glow();
        self.press_after(if target == 1 { 2 } else { 1 }, 300);
    }
}

#[test]
fn round_indices_start_at_one_and_increase() {
    let mut h = Harness::start(GameMode::Unlimited, Difficulty::Medium);
    h.hit(310);
    h.miss();
    h.wait_for(Phase::Scheduled);
    h.press_after(1, 20);
    h.hit(280);
    h.miss();
    h.hit(450);

    let outcomes = h.session.state().outcomes();
    let indices: Vec<u32> = outcomes.iter().map(|o| o.round_index()).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(outcomes[2].classification(), Classification::TooEarly);

    for o in outcomes {
        assert_eq!(o.reaction_time_ms().is_some(), o.is_correct());
    }
}

#[test]
fn debounced_and_locked_presses_change_nothing() {
    let mut h = Harness::start(GameMode::TimeAttack, Difficulty::Easy);
    let target = h.wait_for_glow();
    h.press_after(target, 300);
    assert_eq!(h.session.state().combo(), 1);

    // inside the debounce window
    h.press_after(target, 50);
    // outside it, but the round is already resolved
    h.press_after(target, 150);

    assert_eq!(h.session.state().outcomes().len(), 1);
    assert_eq!(h.session.state().combo(), 1);
    assert_eq!(h.session.state().score(), 700);
}

#[test]
fn hell_ends_on_first_wrong_press() {
    let mut h = Harness::start(GameMode::Unlimited, Difficulty::Hell);
    h.hit(250);
    h.hit(260);
    h.miss();

    let state = h.session.state();
    assert_eq!(state.phase(), Phase::Terminated);
    assert_eq!(state.round_index(), 3);
    assert_eq!(
        state.outcomes().last().map(|o| o.classification()),
        Some(Classification::HellDeath)
    );
    assert_eq!(h.session.next_deadline(), None);

    let summary = h.session.summary().expect("summary after death");
    assert_eq!(summary.reason, EndReason::HellDeath);
    assert_eq!(summary.rounds_played, 3);

    let glows = h.session.presentation().stimuli().len();
    h.advance(10_000);
    assert_eq!(h.session.state().round_index(), 3);
    assert_eq!(h.session.presentation().stimuli().len(), glows);
}

#[test]
fn too_early_is_not_fatal_in_hell() {
    let mut h = Harness::start(GameMode::Unlimited, Difficulty::Hell);
    h.wait_for(Phase::Scheduled);
    h.press_after(1, 10);
    assert_eq!(
        h.session.state().outcomes()[0].classification(),
        Classification::TooEarly
    );
    assert_ne!(h.session.state().phase(), Phase::Terminated);

    h.hit(300);
    assert_eq!(h.session.state().round_index(), 2);
}

#[test]
fn implausibly_fast_press_is_rejected() {
    let mut h = Harness::start(GameMode::TimeAttack, Difficulty::Medium);
    h.hit(400);
    h.hit(80);

    let state = h.session.state();
    let last = state.outcomes().last().unwrap();
    assert_eq!(last.classification(), Classification::RejectedTooFast);
    assert_eq!(last.points_awarded(), 0);
    assert_eq!(last.reaction_time_ms(), None);
    assert_eq!(state.combo(), 1);
    assert_eq!(state.score(), 600);
    assert!(h
        .session
        .presentation()
        .statuses()
        .contains(&"Too fast (80ms)! Press rejected."));
}

#[test]
fn endurance_summarises_instead_of_round_six() {
    let mut h = Harness::start(GameMode::Endurance, Difficulty::Hard);
    for rt in [300, 320, 280, 350, 310] {
        h.hit(rt);
    }
    assert_eq!(h.session.state().round_index(), 5);
    assert_ne!(h.session.state().phase(), Phase::Terminated);

    h.advance(GameMode::Endurance.cooldown_ms());

    let state = h.session.state();
    assert_eq!(state.phase(), Phase::Terminated);
    assert_eq!(state.round_index(), 5);
    assert_eq!(h.session.presentation().stimuli().len(), 5);

    let summary = h.session.summary().unwrap();
    assert_eq!(summary.reason, EndReason::RoundsComplete);
    assert_eq!(summary.avg_reaction_time_ms, Some(312));
    assert_eq!(summary.best_reaction_time_ms, Some(280));
    assert_eq!(summary.accuracy, 1.0);
    assert_eq!(
        h.session.presentation().last_status(),
        Some("Game complete! Avg: 312ms | Accuracy: 100.0%")
    );
}

#[test]
fn combo_multiplies_time_attack_points() {
    let mut h = Harness::start(GameMode::TimeAttack, Difficulty::Easy);
    h.hit(500);
    h.hit(500);
    h.hit(500);

    let points: Vec<u64> = h
        .session
        .state()
        .outcomes()
        .iter()
        .map(|o| o.points_awarded())
        .collect();
    assert_eq!(points, vec![500, 550, 600]);
    assert_eq!(h.session.state().max_combo(), 3);
    assert_eq!(h.session.state().score(), 1_650);
}

#[test]
fn wrong_press_resets_combo_but_not_score() {
    let mut h = Harness::start(GameMode::TimeAttack, Difficulty::Easy);
    h.hit(500);
    h.hit(500);
    h.miss();
    h.hit(500);

    let state = h.session.state();
    assert_eq!(state.combo(), 1);
    assert_eq!(state.max_combo(), 2);
    assert_eq!(state.score(), 500 + 550 + 500);
}

#[test]
fn time_attack_stops_when_the_clock_runs_out() {
    let mut h = Harness::start(GameMode::TimeAttack, Difficulty::Hard);
    h.advance(15_000);
    assert_eq!(h.session.state().time_remaining_ms(), Some(15_000));

    h.advance(15_000);
    let state = h.session.state();
    assert_eq!(state.time_remaining_ms(), Some(0));
    assert_eq!(state.phase(), Phase::Terminated);
    assert_eq!(h.session.summary().unwrap().reason, EndReason::TimeUp);

    let before = h.session.state().outcomes().len();
    h.press_after(1, 200);
    h.press_after(2, 200);
    assert_eq!(h.session.state().outcomes().len(), before);
}

#[test]
fn time_pressure_shortens_delays() {
    let easy = Difficulty::Easy.settings();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let fresh = scheduler::next_delay(
            &mut rng,
            GameMode::TimeAttack,
            Difficulty::Easy,
            Some(60_000),
        );
        assert!((2_000..=4_000).contains(&fresh));

        let spent =
            scheduler::next_delay(&mut rng, GameMode::TimeAttack, Difficulty::Easy, Some(0));
        assert!((1_200..=2_400).contains(&spent));
    }

    // the floor only bites for short tiers
    assert_eq!(
        scheduler::scaled_delay(200, GameMode::TimeAttack, Some(0), easy.time_limit_ms),
        200
    );
    assert_eq!(
        scheduler::scaled_delay(300, GameMode::TimeAttack, Some(0), easy.time_limit_ms),
        200
    );
}

#[test]
fn unlimited_history_rolls_over_twenty() {
    let mut h = Harness::start(GameMode::Unlimited, Difficulty::Hard);
    for i in 0..22 {
        h.hit(250 + i);
    }
    let now = h.clock.advance(10);
    h.session.stop(now);
    h.session
        .start_session(GameMode::Unlimited, Difficulty::Hard, h.clock.advance(10));

    let history = h.session.state().history();
    assert_eq!(history.len(), 20);
    assert_eq!(history[0].reaction_time_ms(), Some(252));
    assert_eq!(h.session.state().best_reaction_time_ms(), Some(250));
}

#[test]
fn sessions_are_independent() {
    let mut a = Harness::start(GameMode::TimeAttack, Difficulty::Easy);
    let mut b = Harness::start(GameMode::Endurance, Difficulty::Easy);
    a.hit(300);
    a.hit(300);
    b.miss();

    assert_eq!(a.session.state().combo(), 2);
    assert_eq!(b.session.state().combo(), 0);
    assert_eq!(b.session.state().score(), 0);
}

#[test]
fn finished_session_lands_on_the_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glowtap.db");

    let config = SessionConfig {
        player_name: Some("ada".to_string()),
        ..SessionConfig::default()
    };
    let session = GameSession::new(config, RecordingPresentation::new())
        .with_seed(5)
        .with_persistence(Box::new(ReactionDb::open(&path).unwrap()));
    let mut h = Harness::with_session(session, GameMode::Endurance, Difficulty::Medium);
    for rt in [300, 340, 320, 360, 330] {
        h.hit(rt);
    }
    h.advance(GameMode::Endurance.cooldown_ms());

    let rank = h.session.last_rank().expect("score was ranked");
    assert_eq!((rank.rank, rank.total), (1, 1));
    assert_eq!(
        h.session.presentation().last_status(),
        Some("ada ranked #1 of 1")
    );

    let db = ReactionDb::open(&path).unwrap();
    assert_eq!(db.recent_attempts().unwrap().len(), 5);
    assert_eq!(db.best_reaction_time().unwrap(), Some(300));
    let top = db.top_scores(GameMode::Endurance, 10).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "ada");
    assert_eq!(top[0].avg_time_ms, 330.0);
}
