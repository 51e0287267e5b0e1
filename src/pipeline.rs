use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::event::{MatchKey, Skip};
use crate::extract::Extractor;
use crate::normalize::normalize_fragment;
use crate::snapshot::SnapshotRow;
use crate::source::{ArticleFragments, FragmentSource};
use crate::timeline::{Aggregator, Timeline};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub articles: usize,
    pub articles_failed: usize,
    pub articles_interrupted: usize,
    pub fragments: usize,
    pub events_extracted: usize,
    pub events_accepted: usize,
    pub parse_misses: usize,
    pub unattributable_markers: usize,
    pub temporal_regressions: usize,
    pub unidentified: usize,
    pub errors: Vec<String>,
}

impl RunSummary {
    fn count_skip(&mut self, skip: Skip) {
        match skip {
            Skip::ParseMiss => self.parse_misses += 1,
            Skip::UnattributableMarker => self.unattributable_markers += 1,
            Skip::TemporalRegression => self.temporal_regressions += 1,
            Skip::Unidentified => self.unidentified += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.parse_misses + self.unattributable_markers + self.temporal_regressions + self.unidentified
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleReport {
    pub url: String,
    pub fragments: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub interrupted: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub timelines: Vec<Timeline>,
    pub summary: RunSummary,
}

impl RunOutput {
    pub fn snapshots(&self) -> Vec<SnapshotRow> {
        self.timelines
            .iter()
            .filter_map(SnapshotRow::from_timeline)
            .collect()
    }
}

type Clock = Box<dyn FnMut() -> DateTime<Utc>>;

pub struct LiveRun {
    extractor: Extractor,
    aggregator: Aggregator,
    summary: RunSummary,
    clock: Clock,
    started_at: DateTime<Utc>,
}

impl Default for LiveRun {
    fn default() -> Self {
        Self::new(Extractor::standard())
    }
}

impl LiveRun {
    pub fn new(extractor: Extractor) -> Self {
        Self::with_clock(extractor, Box::new(Utc::now))
    }

    pub fn with_clock(extractor: Extractor, mut clock: Clock) -> Self {
        let started_at = clock();
        Self {
            extractor,
            aggregator: Aggregator::new(),
            summary: RunSummary::default(),
            clock,
            started_at,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn process_fragment(&mut self, raw: &str) -> Result<MatchKey, Skip> {
        self.summary.fragments += 1;
        let text = normalize_fragment(raw);
        let at = (self.clock)();
        let outcome = match self.extractor.extract_traced(&text, at) {
            Some((rule, event)) => {
                self.summary.events_extracted += 1;
                debug!(rule, minute = ?event.minute, "event extracted");
                self.aggregator.ingest(event)
            }
            None => Err(Skip::ParseMiss),
        };
        match &outcome {
            Ok(key) => {
                self.summary.events_accepted += 1;
                debug!(match_key = %key, "event accepted");
            }
            Err(skip) => {
                self.summary.count_skip(*skip);
                debug!(reason = %skip, "fragment skipped");
            }
        }
        outcome
    }

    pub fn ingest_article(&mut self, article: &ArticleFragments) -> ArticleReport {
        self.summary.articles += 1;
        let mut report = ArticleReport {
            url: article.url.clone(),
            fragments: article.fragments.len(),
            interrupted: article.interrupted.is_some(),
            ..ArticleReport::default()
        };
        for fragment in &article.fragments {
            match self.process_fragment(fragment) {
                Ok(_) => report.accepted += 1,
                Err(_) => report.skipped += 1,
            }
        }
        if let Some(reason) = &article.interrupted {
            self.summary.articles_interrupted += 1;
            warn!(url = %article.url, reason = %reason, "article collection interrupted");
        }
        info!(
            url = %article.url,
            fragments = report.fragments,
            accepted = report.accepted,
            "article processed"
        );
        report
    }

    pub fn run_source(&mut self, source: &mut dyn FragmentSource) -> Vec<ArticleReport> {
        let mut reports = Vec::new();
        while let Some(next) = source.next_article() {
            match next {
                Ok(article) => reports.push(self.ingest_article(&article)),
                Err(err) => {
                    let msg = format!("{err:#}");
                    warn!(error = %msg, "article skipped");
                    self.summary.articles_failed += 1;
                    self.summary.errors.push(msg);
                }
            }
        }
        reports
    }

    pub fn finish(mut self) -> RunOutput {
        let finished_at = (self.clock)();
        info!(
            matches = self.aggregator.len(),
            accepted = self.summary.events_accepted,
            skipped = self.summary.skipped(),
            "run finished"
        );
        RunOutput {
            started_at: self.started_at,
            finished_at,
            timelines: self.aggregator.into_timelines(),
            summary: self.summary,
        }
    }
}
