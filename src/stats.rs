use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::app_dirs::AppDirs;
use crate::collaborators::Persistence;
use crate::error::{Error, Result};
use crate::mode::{Difficulty, GameMode};
use crate::outcome::{Classification, RankInfo, RoundOutcome, ScoreSubmission};

/// Attempts kept in the rolling local history
pub const RECENT_ATTEMPTS_CAP: usize = 20;

/// One row of the local leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub max_combo: u32,
    pub avg_time_ms: f64,
    pub accuracy_pct: f64,
    pub date: DateTime<Utc>,
}

/// SQLite store for the rolling attempt history and the leaderboard
#[derive(Debug)]
pub struct ReactionDb {
    conn: Connection,
}

impl ReactionDb {
    /// Open the database under the user's state directory
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("glowtap.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS recent_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                round_index INTEGER NOT NULL,
                reaction_time_ms INTEGER,
                classification TEXT NOT NULL,
                points INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                mode TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                max_combo INTEGER NOT NULL DEFAULT 0,
                avg_time REAL NOT NULL,
                accuracy REAL NOT NULL,
                date TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_leaderboard_mode ON leaderboard(mode)",
            [],
        )?;

        Ok(ReactionDb { conn })
    }

    /// Append an attempt and trim the history to the newest rows
    pub fn record_attempt(&self, outcome: &RoundOutcome) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO recent_attempts
            (round_index, reaction_time_ms, classification, points, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                outcome.round_index(),
                outcome.reaction_time_ms(),
                outcome.classification().to_string(),
                outcome.points_awarded(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.conn.execute(
            r#"
            DELETE FROM recent_attempts WHERE id NOT IN (
                SELECT id FROM recent_attempts ORDER BY id DESC LIMIT ?1
            )
            "#,
            [RECENT_ATTEMPTS_CAP as i64],
        )?;

        Ok(())
    }

    /// Stored history, oldest first
    pub fn recent_attempts(&self) -> Result<Vec<RoundOutcome>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT round_index, reaction_time_ms, classification, points
            FROM recent_attempts
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, Option<u64>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut outcomes = Vec::new();
        for row in rows {
            let (round_index, reaction_time_ms, classification, points) = row?;
            let classification =
                parse_column::<Classification>("recent_attempts", &classification)?;
            let outcome = match (classification, reaction_time_ms) {
                (Classification::Correct, Some(ms)) => {
                    RoundOutcome::correct(round_index, ms, points)
                }
                (Classification::Correct, None) => {
                    return Err(Error::CorruptRecord {
                        table: "recent_attempts",
                        message: format!("correct attempt {} has no reaction time", round_index),
                    })
                }
                (other, _) => RoundOutcome::missed(round_index, other),
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    pub fn best_reaction_time(&self) -> Result<Option<u64>> {
        let best: Option<u64> = self.conn.query_row(
            "SELECT MIN(reaction_time_ms) FROM recent_attempts WHERE classification = 'correct'",
            [],
            |row| row.get(0),
        )?;
        Ok(best)
    }

    /// Insert a finished session and report where it ranks in its mode
    pub fn save_score(&self, submission: &ScoreSubmission) -> Result<RankInfo> {
        let now = Utc::now();
        let mode = submission.mode.to_string();
        self.conn.execute(
            r#"
            INSERT INTO leaderboard
            (name, score, mode, difficulty, max_combo, avg_time, accuracy, date, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                submission.player_name,
                submission.score,
                mode,
                submission.difficulty.to_string(),
                submission.max_combo,
                submission.avg_reaction_time_ms,
                submission.accuracy_pct,
                now.to_rfc3339(),
                now.timestamp(),
            ],
        )?;

        let better: i64 = if submission.mode.awards_points() {
            self.conn.query_row(
                "SELECT COUNT(*) FROM leaderboard WHERE mode = ?1 AND score > ?2",
                params![mode, submission.score],
                |row| row.get(0),
            )?
        } else {
            self.conn.query_row(
                "SELECT COUNT(*) FROM leaderboard WHERE mode = ?1 AND avg_time < ?2",
                params![mode, submission.avg_reaction_time_ms],
                |row| row.get(0),
            )?
        };
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM leaderboard WHERE mode = ?1",
            [&mode],
            |row| row.get(0),
        )?;

        Ok(RankInfo {
            rank: better as usize + 1,
            total: total as usize,
        })
    }

    /// Best entries for a mode: time attack by score, the rest by average time
    pub fn top_scores(&self, mode: GameMode, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let order = if mode.awards_points() {
            "score DESC, timestamp ASC"
        } else {
            "avg_time ASC, timestamp ASC"
        };
        let sql = format!(
            r#"
            SELECT name, score, mode, difficulty, max_combo, avg_time, accuracy, date
            FROM leaderboard
            WHERE mode = ?1
            ORDER BY {}
            LIMIT ?2
            "#,
            order
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt.query_map(params![mode.to_string(), limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, score, mode, difficulty, max_combo, avg_time_ms, accuracy_pct, date) = row?;
            let date = DateTime::parse_from_rfc3339(&date)
                .map_err(|e| Error::CorruptRecord {
                    table: "leaderboard",
                    message: e.to_string(),
                })?
                .with_timezone(&Utc);
            entries.push(LeaderboardEntry {
                name,
                score,
                mode: parse_column("leaderboard", &mode)?,
                difficulty: parse_column("leaderboard", &difficulty)?,
                max_combo,
                avg_time_ms,
                accuracy_pct,
                date,
            });
        }

        Ok(entries)
    }

}

fn parse_column<T: FromStr>(table: &'static str, value: &str) -> Result<T> {
    T::from_str(value).map_err(|_| Error::CorruptRecord {
        table,
        message: format!("unknown value {:?}", value),
    })
}

impl Persistence for ReactionDb {
    fn append_outcome(&mut self, outcome: &RoundOutcome) -> Result<()> {
        self.record_attempt(outcome)
    }

    fn submit_session_summary(&mut self, submission: &ScoreSubmission) -> Result<RankInfo> {
        self.save_score(submission)
    }
}
