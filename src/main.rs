mod ui;

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use glowtap::{
    app_dirs::AppDirs,
    clock::{Clock, MonotonicClock},
    coach::MiniCoach,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    stats::{LeaderboardEntry, ReactionDb},
    Difficulty, GameMode, GameSession, Presentation, PressSink, RoundOutcome,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 16;
const LEADERBOARD_ROWS: usize = 10;
const TWEET_INTENT_URL: &str = "https://twitter.com/intent/tweet";

/// reaction-time button game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Wait for a button to glow, then hit its number as fast as you can. \
                  Time attack, unlimited practice and endurance modes, four difficulty tiers \
                  and a local leaderboard."
)]
pub struct Cli {
    /// game mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// difficulty tier
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of buttons on the board (2-9)
    #[clap(short = 'b', long)]
    buttons: Option<u8>,

    /// rounds in an endurance session
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// name to put on the leaderboard; scores are only saved when set
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// fixed seed for the target and delay picks
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Flags win over stored settings
    fn merge_into(&self, mut config: Config) -> Config {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(buttons) = self.buttons {
            config.button_count = buttons;
        }
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if let Some(name) = &self.name {
            config.player_name = Some(name.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Menu,
    Playing,
    Results,
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What the game core last told us, kept for drawing
#[derive(Debug, Default, Clone)]
pub struct ScreenPresentation {
    pub lit: Option<u8>,
    pub status: String,
    pub coaching: Option<String>,
    pub last_outcome: Option<RoundOutcome>,
}

impl Presentation for ScreenPresentation {
    fn show_stimulus(&mut self, target_button: u8) {
        self.lit = Some(target_button);
    }

    fn clear_stimulus(&mut self) {
        self.lit = None;
    }

    fn report_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn report_round_outcome(&mut self, outcome: &RoundOutcome) {
        self.last_outcome = Some(outcome.clone());
    }

    fn report_coaching(&mut self, message: &str) {
        self.coaching = Some(message.to_string());
    }
}

#[derive(Debug)]
pub struct LeaderboardState {
    pub mode: GameMode,
    pub entries: Vec<LeaderboardEntry>,
    pub error: Option<String>,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    pub session: GameSession<ScreenPresentation>,
    pub leaderboard: LeaderboardState,
    return_to: AppState,
    store: Option<ReactionDb>,
}

impl App {
    pub fn new(
        config: Config,
        session: GameSession<ScreenPresentation>,
        store: Option<ReactionDb>,
    ) -> Self {
        Self {
            leaderboard: LeaderboardState {
                mode: config.mode,
                entries: Vec::new(),
                error: None,
            },
            config,
            state: AppState::Menu,
            session,
            return_to: AppState::Menu,
            store,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        *self.session.presentation_mut() = ScreenPresentation::default();
        self.session
            .start_session(self.config.mode, self.config.difficulty, now_ms);
        self.state = AppState::Playing;
    }

    pub fn on_tick(&mut self, now_ms: u64) {
        if self.state == AppState::Playing {
            self.session.tick(now_ms);
            self.sync_state();
        }
    }

    fn sync_state(&mut self) {
        if self.state == AppState::Playing && self.session.state().is_over() {
            self.state = AppState::Results;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now_ms: u64) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.session.stop(now_ms);
            return Flow::Quit;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Esc => return Flow::Quit,
                KeyCode::Char(' ') | KeyCode::Enter => self.start(now_ms),
                KeyCode::Char('m') => self.config.mode = cycle(self.config.mode),
                KeyCode::Char('d') => self.config.difficulty = cycle(self.config.difficulty),
                KeyCode::Char('l') => self.open_leaderboard(),
                _ => {}
            },
            AppState::Playing => match key.code {
                KeyCode::Esc => self.session.stop(now_ms),
                KeyCode::Char(c) => {
                    if let Some(button) = c.to_digit(10) {
                        self.session.press(button as u8, now_ms);
                    }
                }
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Esc => return Flow::Quit,
                KeyCode::Char(' ') | KeyCode::Char('r') => self.start(now_ms),
                KeyCode::Char('m') => self.state = AppState::Menu,
                KeyCode::Char('l') => self.open_leaderboard(),
                KeyCode::Char('t') => {
                    if let Some(url) = self.share_url() {
                        if Browser::is_available() {
                            if let Err(e) = webbrowser::open(&url) {
                                warn!("Failed to open browser: {}", e);
                            }
                        }
                    }
                }
                _ => {}
            },
            AppState::Leaderboard => match key.code {
                KeyCode::Esc => return Flow::Quit,
                KeyCode::Char('b') | KeyCode::Backspace => self.state = self.return_to,
                KeyCode::Tab | KeyCode::Right => {
                    self.leaderboard.mode = cycle(self.leaderboard.mode);
                    self.load_leaderboard();
                }
                KeyCode::BackTab | KeyCode::Left => {
                    self.leaderboard.mode = cycle_back(self.leaderboard.mode);
                    self.load_leaderboard();
                }
                _ => {}
            },
        }

        self.sync_state();
        Flow::Continue
    }

    fn open_leaderboard(&mut self) {
        self.return_to = self.state;
        self.leaderboard.mode = self.config.mode;
        self.load_leaderboard();
        self.state = AppState::Leaderboard;
    }

    fn load_leaderboard(&mut self) {
        let Some(store) = &self.store else {
            self.leaderboard.entries.clear();
            self.leaderboard.error = Some("Leaderboard unavailable".to_string());
            return;
        };
        match store.top_scores(self.leaderboard.mode, LEADERBOARD_ROWS) {
            Ok(entries) => {
                self.leaderboard.entries = entries;
                self.leaderboard.error = None;
            }
            Err(e) => {
                warn!("Failed to load leaderboard: {}", e);
                self.leaderboard.entries.clear();
                self.leaderboard.error = Some(e.to_string());
            }
        }
    }

    pub fn share_url(&self) -> Option<String> {
        let summary = self.session.summary()?;
        let headline = match summary.mode {
            GameMode::TimeAttack => format!("{}%20points", summary.score),
            GameMode::Unlimited | GameMode::Endurance => {
                format!("{}ms%20avg", summary.avg_reaction_time_ms?)
            }
        };
        Some(format!(
            "{}?text=glowtap%20{}%3A%20{}%20%2F%20{}%25%20acc%20%2F%20{}x%20combo",
            TWEET_INTENT_URL,
            summary.mode,
            headline,
            summary.accuracy_pct(),
            summary.max_combo
        ))
    }

    /// How long the loop may sleep before the game needs attention
    pub fn wait_budget(&self, now_ms: u64) -> Option<Duration> {
        self.session
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(now_ms)))
    }
}

fn cycle<T: ValueEnum + PartialEq + Copy>(current: T) -> T {
    let all = T::value_variants();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(idx + 1) % all.len()]
}

fn cycle_back<T: ValueEnum + PartialEq + Copy>(current: T) -> T {
    let all = T::value_variants();
    let idx = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(idx + all.len() - 1) % all.len()]
}

fn init_logging() -> anyhow::Result<()> {
    let Some(path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glowtap=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_session(config: &Config, seed: Option<u64>) -> GameSession<ScreenPresentation> {
    let mut session = GameSession::new(config.session_config(), ScreenPresentation::default())
        .with_coach(Box::new(MiniCoach::new()));
    if let Some(seed) = seed {
        session = session.with_seed(seed);
    }

    match ReactionDb::new() {
        Ok(db) => {
            match db.recent_attempts() {
                Ok(history) => session = session.with_history(history),
                Err(e) => warn!("Ignoring stored attempts: {}", e),
            }
            session = session.with_persistence(Box::new(db));
        }
        Err(e) => warn!("Stats database unavailable, playing without history: {}", e),
    }
    session
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = init_logging() {
        eprintln!("logging disabled: {e:#}");
    }

    let store = FileConfigStore::new();
    let config = cli.merge_into(store.load());
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e.to_string()).exit();
    }
    info!("Starting with {:?}", config);

    let session = build_session(&config, cli.seed);
    let leaderboard_store = ReactionDb::new()
        .map_err(|e| warn!("Leaderboard unavailable: {}", e))
        .ok();
    let mut app = App::new(config, session, leaderboard_store);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner, &MonotonicClock::new());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = store.save(&app.config) {
        warn!("Failed to save config to {}: {}", store.path().display(), e);
    }

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    clock: &C,
) -> anyhow::Result<()> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let budget = app
            .wait_budget(clock.now_ms())
            .unwrap_or(Duration::from_millis(TICK_RATE_MS));

        match runner.step_within(budget) {
            GameEvent::Tick => app.on_tick(clock.now_ms()),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key, clock.now_ms()) == Flow::Quit {
                    break;
                }
                // timers that came due while the key was queued
                app.on_tick(clock.now_ms());
            }
        }

        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
