use chrono::{DateTime, Utc};
use glowtap::{stats::LeaderboardEntry, GameMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::App;

/// "5 minutes ago" style age of an entry
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match (now - date).to_std() {
        Ok(age) => HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past),
        Err(_) => "just now".to_string(),
    }
}

/// Pure presenter for a single leaderboard row
pub fn present_row(rank: usize, entry: &LeaderboardEntry, now: DateTime<Utc>) -> Row<'static> {
    let rank_style = match rank {
        1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        2 | 3 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default(),
    };

    let headline = match entry.mode {
        GameMode::TimeAttack => entry.score.to_string(),
        GameMode::Unlimited | GameMode::Endurance => format!("{:.0} ms", entry.avg_time_ms),
    };

    let accuracy_color = if entry.accuracy_pct >= 90.0 {
        Color::Green
    } else if entry.accuracy_pct >= 70.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    Row::new(vec![
        Cell::from(format!("#{rank}")).style(rank_style),
        Cell::from(entry.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(headline),
        Cell::from(entry.difficulty.label()),
        Cell::from(format!("{}x", entry.max_combo)),
        Cell::from(format!("{:.1}%", entry.accuracy_pct))
            .style(Style::default().fg(accuracy_color)),
        Cell::from(relative_date(entry.date, now)),
    ])
}

/// Render the leaderboard for the selected mode
pub fn render_leaderboard(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let mode = app.leaderboard.mode;
    let ranked_by = if mode.awards_points() {
        "score"
    } else {
        "average time"
    };
    let title = Paragraph::new(format!("{} (by {})", mode.label(), ranked_by))
        .block(Block::default().borders(Borders::ALL).title("Leaderboard"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if let Some(error) = &app.leaderboard.error {
        let msg = Paragraph::new(error.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red));
        f.render_widget(msg, chunks[1]);
    } else if app.leaderboard.entries.is_empty() {
        let no_data = Paragraph::new("No scores yet. Set a name with --name to get on the board.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let headline = if mode.awards_points() {
            "Score"
        } else {
            "Avg"
        };
        let header = Row::new(vec!["Rank", "Name", headline, "Tier", "Combo", "Acc", "When"])
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );

        let now = Utc::now();
        let rows: Vec<Row> = app
            .leaderboard
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| present_row(i + 1, entry, now))
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(16),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL))
            .column_spacing(1);
        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(tab/←/→) mode  (b/backspace) back  (esc)ape")
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[2]);
}
