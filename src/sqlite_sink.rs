use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::event::{MatchEvent, MatchKey};
use crate::pipeline::RunOutput;
use crate::sink::{LoggedEvent, MatchSink, WriteReport};
use crate::snapshot::SnapshotRow;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS live_updates (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NULL,
            match_key TEXT NOT NULL,
            minute INTEGER NULL,
            home_team TEXT NULL,
            away_team TEXT NULL,
            home_score TEXT NULL,
            away_score TEXT NULL,
            is_final INTEGER NOT NULL,
            is_halftime INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_live_updates_key ON live_updates(match_key, seq);

        CREATE TABLE IF NOT EXISTS live_scores (
            match_key TEXT PRIMARY KEY,
            home_team TEXT NULL,
            away_team TEXT NULL,
            home_score TEXT NULL,
            away_score TEXT NULL,
            minute INTEGER NULL,
            is_final INTEGER NOT NULL,
            is_halftime INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS scrape_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            articles INTEGER NOT NULL DEFAULT 0,
            articles_failed INTEGER NOT NULL DEFAULT 0,
            fragments INTEGER NOT NULL DEFAULT 0,
            events_accepted INTEGER NOT NULL DEFAULT 0,
            skipped INTEGER NOT NULL DEFAULT 0,
            events_written INTEGER NOT NULL DEFAULT 0,
            snapshots_written INTEGER NOT NULL DEFAULT 0,
            errors_json TEXT NOT NULL DEFAULT '[]'
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// SQLite-backed sink: `live_updates` is the append log, `live_scores` holds one row per
/// match key, `scrape_runs` one row per run.
pub struct SqliteSink {
    conn: Connection,
    run_id: Option<i64>,
}

impl SqliteSink {
    pub fn open_path(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_db(path)?,
            run_id: None,
        })
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn, run_id: None })
    }

    pub fn load_snapshots(&self) -> Result<Vec<SnapshotRow>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT match_key, home_team, away_team, home_score, away_score,
                       minute, is_final, is_halftime, updated_at
                FROM live_scores
                ORDER BY match_key ASC
                "#,
            )
            .context("prepare load snapshots query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<u32>>(5)?,
                    row.get::<_, i64>(6)? != 0,
                    row.get::<_, i64>(7)? != 0,
                    row.get::<_, String>(8)?,
                ))
            })
            .context("query load snapshots")?;

        let mut out = Vec::new();
        for row in rows {
            let (key, home, away, hs, aws, minute, is_final, is_halftime, updated) =
                row.context("decode snapshot row")?;
            out.push(SnapshotRow {
                match_key: MatchKey::from(key.as_str()),
                home_team: home,
                away_team: away,
                home_score: hs,
                away_score: aws,
                minute,
                is_final,
                is_halftime,
                updated_at: parse_ts(&updated)?,
            });
        }
        Ok(out)
    }

    pub fn load_snapshot(&self, key: &MatchKey) -> Result<Option<SnapshotRow>> {
        Ok(self
            .load_snapshots()?
            .into_iter()
            .find(|row| &row.match_key == key))
    }

    pub fn load_events(&self, key: &MatchKey) -> Result<Vec<LoggedEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT minute, home_team, away_team, home_score, away_score,
                       is_final, is_halftime, timestamp
                FROM live_updates
                WHERE match_key = ?1
                ORDER BY seq ASC
                "#,
            )
            .context("prepare load events query")?;
        let rows = stmt
            .query_map(params![key.as_str()], |row| {
                Ok((
                    row.get::<_, Option<u32>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i64>(5)? != 0,
                    row.get::<_, i64>(6)? != 0,
                    row.get::<_, String>(7)?,
                ))
            })
            .context("query load events")?;

        let mut out = Vec::new();
        for row in rows {
            let (minute, home, away, hs, aws, is_final, is_halftime, ts) =
                row.context("decode event row")?;
            out.push(LoggedEvent {
                match_key: key.clone(),
                event: MatchEvent {
                    minute,
                    home_team: home,
                    away_team: away,
                    home_score: hs,
                    away_score: aws,
                    is_final,
                    is_halftime,
                    extracted_at: parse_ts(&ts)?,
                },
            });
        }
        Ok(out)
    }

    pub fn last_run_finished_at(&self) -> Result<Option<DateTime<Utc>>> {
        let raw = self
            .conn
            .query_row(
                "SELECT finished_at FROM scrape_runs WHERE finished_at IS NOT NULL ORDER BY run_id DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("query last run")?;
        raw.as_deref().map(parse_ts).transpose()
    }
}

impl MatchSink for SqliteSink {
    fn open(&mut self, started_at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO scrape_runs(started_at) VALUES (?1)",
                params![started_at.to_rfc3339()],
            )
            .context("insert scrape run")?;
        self.run_id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    fn append_event(&mut self, key: &MatchKey, event: &MatchEvent) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO live_updates (
                    run_id, match_key, minute, home_team, away_team,
                    home_score, away_score, is_final, is_halftime, timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    self.run_id,
                    key.as_str(),
                    event.minute,
                    event.home_team,
                    event.away_team,
                    event.home_score,
                    event.away_score,
                    bool_to_i64(event.is_final),
                    bool_to_i64(event.is_halftime),
                    event.extracted_at.to_rfc3339(),
                ],
            )
            .context("insert live update")?;
        Ok(())
    }

    fn upsert_snapshot(&mut self, row: &SnapshotRow) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO live_scores (
                    match_key, home_team, away_team, home_score, away_score,
                    minute, is_final, is_halftime, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(match_key) DO UPDATE SET
                    home_team = excluded.home_team,
                    away_team = excluded.away_team,
                    home_score = excluded.home_score,
                    away_score = excluded.away_score,
                    minute = excluded.minute,
                    is_final = excluded.is_final,
                    is_halftime = excluded.is_halftime,
                    updated_at = excluded.updated_at
                "#,
                params![
                    row.match_key.as_str(),
                    row.home_team,
                    row.away_team,
                    row.home_score,
                    row.away_score,
                    row.minute,
                    bool_to_i64(row.is_final),
                    bool_to_i64(row.is_halftime),
                    row.updated_at.to_rfc3339(),
                ],
            )
            .context("upsert live score")?;
        Ok(())
    }

    fn record_run(&mut self, output: &RunOutput, report: &WriteReport) -> Result<()> {
        let Some(run_id) = self.run_id else {
            return Err(anyhow!("no open scrape run"));
        };
        let mut errors = output.summary.errors.clone();
        errors.extend(report.failures.iter().cloned());
        let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
        let s = &output.summary;
        self.conn
            .execute(
                r#"
                UPDATE scrape_runs
                SET finished_at = ?1, articles = ?2, articles_failed = ?3, fragments = ?4,
                    events_accepted = ?5, skipped = ?6, events_written = ?7,
                    snapshots_written = ?8, errors_json = ?9
                WHERE run_id = ?10
                "#,
                params![
                    output.finished_at.to_rfc3339(),
                    s.articles as i64,
                    s.articles_failed as i64,
                    s.fragments as i64,
                    s.events_accepted as i64,
                    s.skipped() as i64,
                    report.events_written as i64,
                    report.snapshots_written as i64,
                    errors_json,
                    run_id
                ],
            )
            .context("update scrape run")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.run_id = None;
        Ok(())
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp {raw}"))
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
