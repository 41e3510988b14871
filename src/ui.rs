pub mod charting;
pub mod leaderboard;
pub mod screen;

use glowtap::{
    mode::Difficulty, outcome::SessionSummary, round::Phase, util::mean, Classification,
    GameMode, RoundOutcome, SessionState,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget, Wrap,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const ATTEMPT_ROWS: usize = 4;
const COUNTDOWN_WARNING_MS: u64 = 10_000;

pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn difficulty_color(difficulty: Difficulty) -> Color {
    match difficulty {
        Difficulty::Easy => Color::Green,
        Difficulty::Medium => Color::Yellow,
        Difficulty::Hard => Color::LightRed,
        Difficulty::Hell => Color::Red,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Menu => render_menu(self, area, buf),
            AppState::Playing => render_board(self, area, buf),
            AppState::Results => render_results(self, area, buf),
            // drawn by its own screen
            AppState::Leaderboard => {}
        }
    }
}

fn classification_color(classification: Classification) -> Color {
    match classification {
        Classification::Correct => Color::Green,
        Classification::RejectedTooFast | Classification::TooEarly => Color::Yellow,
        Classification::Wrong | Classification::HellDeath => Color::Red,
    }
}

/// "3 correct · 1 wrong · 1 too early"
pub fn tally_line(outcomes: &[RoundOutcome]) -> String {
    SessionSummary::tally(outcomes)
        .into_iter()
        .map(|(classification, n)| format!("{} {}", n, classification.label().to_lowercase()))
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Running average and hit/miss counts while a session is live
pub fn live_metrics(state: &SessionState) -> String {
    let times: Vec<f64> = state
        .outcomes()
        .iter()
        .filter_map(RoundOutcome::reaction_time_ms)
        .map(|ms| ms as f64)
        .collect();
    let avg = mean(&times).map_or_else(|| "-".to_string(), |m| format!("{:.0}", m));
    format!(
        "avg {}ms · {} correct · {} wrong",
        avg,
        state.count(Classification::Correct),
        state.count(Classification::Wrong) + state.count(Classification::HellDeath)
    )
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let config = &app.config;

    let mode_hint = match config.mode {
        GameMode::TimeAttack => format!(
            "score as much as you can in {}s",
            config.difficulty.settings().time_limit_ms / 1_000
        ),
        GameMode::Unlimited => "practice with no clock".to_string(),
        GameMode::Endurance => format!("{} rounds, best average wins", config.max_rounds),
    };
    let hell_hint = if config.difficulty.is_hell() {
        "one wrong button ends the run"
    } else {
        ""
    };

    let lines = vec![
        Line::from(Span::styled(
            "glowtap",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("mode  ", dim_style),
            Span::styled(config.mode.label(), bold_style),
            Span::styled(format!("  {}", mode_hint), dim_style),
        ]),
        Line::from(vec![
            Span::styled("tier  ", dim_style),
            Span::styled(
                config.difficulty.label(),
                bold_style.fg(difficulty_color(config.difficulty)),
            ),
            Span::styled(format!("  {}", hell_hint), dim_style),
        ]),
        Line::from(vec![
            Span::styled("board ", dim_style),
            Span::styled(format!("{} buttons", config.button_count), bold_style),
        ]),
        Line::from(vec![
            Span::styled("name  ", dim_style),
            match &config.player_name {
                Some(name) => Span::styled(name.clone(), bold_style),
                None => Span::styled("(scores not saved)", dim_style),
            },
        ]),
    ];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(lines.len() as u16),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(space) start / (m)ode / (d)ifficulty / (l)eaderboard / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let state = app.session.state();
    let presentation = app.session.presentation();
    let button_count = app.session.config().button_count;

    let mut header = vec![
        Span::styled(
            format!("{} · {}", state.mode().label(), state.difficulty().label()),
            bold_style.fg(difficulty_color(state.difficulty())),
        ),
        Span::raw("   "),
    ];
    match state.mode() {
        GameMode::TimeAttack => {
            let remaining = state.time_remaining_ms().unwrap_or_default();
            let clock_style = if remaining <= COUNTDOWN_WARNING_MS {
                bold_style.fg(Color::Red).add_modifier(Modifier::SLOW_BLINK)
            } else {
                bold_style
            };
            let secs = remaining as f64 / 1_000.0;
            header.push(Span::styled(format!("{:.0}s left", secs), clock_style));
            header.push(Span::raw("   "));
            header.push(Span::raw(format!(
                "score {}   combo {}x",
                state.score(),
                state.combo()
            )));
        }
        GameMode::Endurance => {
            header.push(Span::raw(format!(
                "round {}/{}",
                state.round_index(),
                app.session.config().max_rounds
            )));
        }
        GameMode::Unlimited => {
            header.push(Span::raw(format!("round {}", state.round_index())));
        }
    }
    if let Some(best) = state.best_reaction_time_ms() {
        header.push(Span::styled(format!("   best {}ms", best), dim_style));
    }

    let attempts_height = ATTEMPT_ROWS as u16 + 1;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),               // header
            Constraint::Length(1),               // padding
            Constraint::Min(3),                  // buttons
            Constraint::Length(1),               // status
            Constraint::Length(1),               // live metrics
            Constraint::Length(attempts_height), // attempts
            Constraint::Length(2),               // coach
            Constraint::Length(1),               // legend
        ])
        .split(area);

    Paragraph::new(Line::from(header))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let pads = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            (0..button_count)
                .map(|_| Constraint::Ratio(1, button_count as u32))
                .collect::<Vec<_>>(),
        )
        .split(chunks[2]);

    for (i, pad) in pads.iter().enumerate() {
        let button = i as u8 + 1;
        let lit = presentation.lit == Some(button);
        let style = if lit {
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD)
        } else {
            dim_style
        };
        let label = button.to_string();
        let top_pad = pad.height.saturating_sub(3) / 2;
        let mut lines = vec![Line::from(""); top_pad as usize];
        lines.push(Line::from(label));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style))
            .render(*pad, buf);
    }

    let status_style = match (&presentation.last_outcome, state.phase()) {
        (Some(outcome), Phase::Resolved) => {
            bold_style.fg(classification_color(outcome.classification()))
        }
        _ => bold_style,
    };
    Paragraph::new(Span::styled(presentation.status.as_str(), status_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    if state.mode() != GameMode::TimeAttack {
        Paragraph::new(Span::styled(live_metrics(state), dim_style))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    render_attempts(&state.recent(), chunks[5], buf);

    render_coach(app, chunks[6], buf);

    Paragraph::new(Span::styled(
        format!("(1-{}) press / (esc) stop", button_count),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[7], buf);
}

/// Newest attempts first
fn render_attempts(recent: &[RoundOutcome], area: Rect, buf: &mut Buffer) {
    if recent.is_empty() {
        return;
    }
    let header = Row::new(vec!["round", "time", "result", "points"])
        .style(Style::default().add_modifier(Modifier::DIM));
    let rows = recent.iter().rev().take(ATTEMPT_ROWS).map(|o| {
        let time = o
            .reaction_time_ms()
            .map_or_else(|| "-".to_string(), |ms| format!("{}ms", ms));
        Row::new(vec![
            Cell::from(o.round_index().to_string()),
            Cell::from(time),
            Cell::from(o.classification().label())
                .style(Style::default().fg(classification_color(o.classification()))),
            Cell::from(o.points_awarded().to_string()),
        ])
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(7),
    ];
    Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .render(centered(area, 39), buf);
}

fn centered(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn render_coach(app: &App, area: Rect, buf: &mut Buffer) {
    if let Some(message) = &app.session.presentation().coaching {
        let text = format!("coach: {}", message);
        let alignment = if text.width() <= area.width as usize {
            Alignment::Center
        } else {
            Alignment::Left
        };
        Paragraph::new(Span::styled(
            text,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(alignment)
        .wrap(Wrap { trim: true })
        .render(area, buf);
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let magenta_style = Style::default().fg(Color::Magenta);
    let state = app.session.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // tally
            Constraint::Length(1), // status
            Constraint::Length(2), // coach
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = charting::reaction_points(state.outcomes());
    if points.is_empty() {
        Paragraph::new(Span::styled(
            "no correct presses this time",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    } else {
        let (last_round, slowest) = charting::compute_chart_params(&points);
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(magenta_style)
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("round")
                    .bounds([1.0, last_round])
                    .labels(vec![
                        Span::styled("1", bold_style),
                        Span::styled(charting::format_label(last_round), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("ms")
                    .bounds([0.0, slowest])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(slowest), bold_style),
                    ]),
            )
            .render(chunks[0], buf);
    }

    if let Some(summary) = app.session.summary() {
        let avg = summary
            .avg_reaction_time_ms
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        let best = summary
            .best_reaction_time_ms
            .map_or_else(|| "-".to_string(), |b| b.to_string());
        let mut stats = format!(
            "{} ms avg   {} ms best   {}% acc   {:.1} sd",
            avg,
            best,
            summary.accuracy_pct(),
            summary.std_dev_ms.unwrap_or_default()
        );
        if summary.mode.awards_points() {
            stats.push_str(&format!(
                "   {} pts   {}x combo",
                summary.score, summary.max_combo
            ));
        }
        Paragraph::new(Span::styled(stats, bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    Paragraph::new(tally_line(state.outcomes()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        app.session.presentation().status.as_str(),
        Style::default().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    render_coach(app, chunks[4], buf);

    Paragraph::new(Span::styled(
        String::from(if Browser::is_available() {
            "(r)etry / (m)enu / (l)eaderboard / (t)weet / (esc)ape"
        } else {
            "(r)etry / (m)enu / (l)eaderboard / (esc)ape"
        }),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}
