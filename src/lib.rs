// Library surface for the binary, headless runs and integration tests.
// The game core never touches the terminal; main.rs owns that.
pub mod app_dirs;
pub mod clock;
pub mod coach;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod mode;
pub mod outcome;
pub mod round;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod timers;
pub mod util;

pub use collaborators::{Coach, Persistence, Presentation, PressSink};
pub use error::{Error, Result};
pub use mode::{Difficulty, GameMode};
pub use outcome::{Classification, EndReason, RoundOutcome, SessionSummary};
pub use session::{GameSession, SessionConfig, SessionState};
