use ratatui::Frame;

use crate::{ui::leaderboard::render_leaderboard, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Menu, board and results all come from the App widget
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct LeaderboardScreen;

impl Screen for LeaderboardScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_leaderboard(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Menu | AppState::Playing | AppState::Results => Box::new(GameScreen),
        AppState::Leaderboard => Box::new(LeaderboardScreen),
    }
}
