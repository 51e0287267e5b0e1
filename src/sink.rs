use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::event::{MatchEvent, MatchKey};
use crate::pipeline::{RunOutput, RunSummary};
use crate::snapshot::SnapshotRow;

pub trait MatchSink {
    fn open(&mut self, started_at: DateTime<Utc>) -> Result<()>;

    fn append_event(&mut self, key: &MatchKey, event: &MatchEvent) -> Result<()>;

    fn upsert_snapshot(&mut self, row: &SnapshotRow) -> Result<()>;

    fn record_run(&mut self, _output: &RunOutput, _report: &WriteReport) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub events_written: usize,
    pub snapshots_written: usize,
    pub failures: Vec<String>,
}

/// Write a finished run. Each event append and each snapshot upsert stands alone: a failed
/// write is logged and counted, the rest still go through. Only failing to open or close
/// the sink is returned as an error.
pub fn write_run(sink: &mut dyn MatchSink, output: &RunOutput) -> Result<WriteReport> {
    sink.open(output.started_at).context("open sink")?;
    let mut report = WriteReport::default();

    for timeline in &output.timelines {
        let key = timeline.key();
        for event in timeline.events() {
            match sink.append_event(key, event) {
                Ok(()) => report.events_written += 1,
                Err(err) => {
                    let msg = format!("{err:#}");
                    warn!(match_key = %key, error = %msg, "event append failed");
                    report.failures.push(format!("append {key}: {msg}"));
                }
            }
        }
        let Some(row) = SnapshotRow::from_timeline(timeline) else {
            continue;
        };
        match sink.upsert_snapshot(&row) {
            Ok(()) => report.snapshots_written += 1,
            Err(err) => {
                let msg = format!("{err:#}");
                warn!(match_key = %key, error = %msg, "snapshot upsert failed");
                report.failures.push(format!("upsert {key}: {msg}"));
            }
        }
    }

    if let Err(err) = sink.record_run(output, &report) {
        let msg = format!("{err:#}");
        warn!(error = %msg, "run record failed");
        report.failures.push(format!("run record: {msg}"));
    }
    sink.close().context("close sink")?;
    info!(
        events = report.events_written,
        snapshots = report.snapshots_written,
        failures = report.failures.len(),
        "run written"
    );
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub match_key: MatchKey,
    #[serde(flatten)]
    pub event: MatchEvent,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<LoggedEvent>,
    pub snapshots: Vec<SnapshotRow>,
    pub runs: Vec<RunSummary>,
    pub reject: HashSet<MatchKey>,
    open: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, key: &MatchKey) -> Option<&SnapshotRow> {
        self.snapshots.iter().find(|row| &row.match_key == key)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn check(&self, key: &MatchKey) -> Result<()> {
        if !self.open {
            return Err(anyhow!("sink is not open"));
        }
        if self.reject.contains(key) {
            return Err(anyhow!("write rejected for {key}"));
        }
        Ok(())
    }
}

impl MatchSink for MemorySink {
    fn open(&mut self, _started_at: DateTime<Utc>) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn append_event(&mut self, key: &MatchKey, event: &MatchEvent) -> Result<()> {
        self.check(key)?;
        self.events.push(LoggedEvent {
            match_key: key.clone(),
            event: event.clone(),
        });
        Ok(())
    }

    fn upsert_snapshot(&mut self, row: &SnapshotRow) -> Result<()> {
        self.check(&row.match_key)?;
        upsert_row(&mut self.snapshots, row);
        Ok(())
    }

    fn record_run(&mut self, output: &RunOutput, _report: &WriteReport) -> Result<()> {
        self.runs.push(output.summary.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

fn upsert_row(rows: &mut Vec<SnapshotRow>, row: &SnapshotRow) {
    match rows.iter_mut().find(|r| r.match_key == row.match_key) {
        Some(existing) => *existing = row.clone(),
        None => rows.push(row.clone()),
    }
}

const JSON_SINK_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct JsonStore {
    version: u32,
    #[serde(default)]
    events: Vec<LoggedEvent>,
    #[serde(default)]
    snapshots: Vec<SnapshotRow>,
    #[serde(default)]
    last_run_at: Option<DateTime<Utc>>,
}

pub struct JsonFileSink {
    path: PathBuf,
    store: Option<JsonStore>,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: None,
        }
    }

    pub fn load_snapshots(path: &Path) -> Result<Vec<SnapshotRow>> {
        Ok(load_store(path)?.snapshots)
    }

    pub fn load_events(path: &Path) -> Result<Vec<LoggedEvent>> {
        Ok(load_store(path)?.events)
    }

    fn store_mut(&mut self) -> Result<&mut JsonStore> {
        self.store.as_mut().ok_or_else(|| anyhow!("json sink is not open"))
    }
}

fn load_store(path: &Path) -> Result<JsonStore> {
    if !path.exists() {
        return Ok(JsonStore {
            version: JSON_SINK_VERSION,
            ..JsonStore::default()
        });
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read json store {}", path.display()))?;
    let store: JsonStore = serde_json::from_str(&raw).context("invalid json store")?;
    if store.version != JSON_SINK_VERSION {
        return Err(anyhow!(
            "json store version {} (expected {JSON_SINK_VERSION})",
            store.version
        ));
    }
    Ok(store)
}

impl MatchSink for JsonFileSink {
    fn open(&mut self, started_at: DateTime<Utc>) -> Result<()> {
        let mut store = load_store(&self.path)?;
        store.last_run_at = Some(started_at);
        self.store = Some(store);
        Ok(())
    }

    fn append_event(&mut self, key: &MatchKey, event: &MatchEvent) -> Result<()> {
        self.store_mut()?.events.push(LoggedEvent {
            match_key: key.clone(),
            event: event.clone(),
        });
        Ok(())
    }

    fn upsert_snapshot(&mut self, row: &SnapshotRow) -> Result<()> {
        upsert_row(&mut self.store_mut()?.snapshots, row);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(store) = self.store.take() else {
            return Ok(());
        };
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).ok();
        }
        let json = serde_json::to_string_pretty(&store).context("serialize json store")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write json store")?;
        fs::rename(&tmp, &self.path).context("swap json store")?;
        Ok(())
    }
}
