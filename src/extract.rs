use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::event::{MatchEvent, StateFlags};
use crate::normalize::clean_team_name;

// Plain substring checks, case-insensitive. Short markers like "FT" and "HT" also hit
// ordinary words ("after", "night"); that noise is part of the observed feed behaviour.
const FULL_TIME_KEYWORDS: &[&str] = &["FT:", "Full-time:", "Full time:", "Full-time", "FT"];
const HALF_TIME_KEYWORDS: &[&str] = &["Half-time", "Half time", "HT:", "HT"];

// "67 mins: Kilkenny 2-20 Galway 1-18", "70+2 mins: ..."
// ASCII digits only: `\d` would also take digits that `u32::from_str` rejects.
static MINUTE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+)(?:\+([0-9]+))?\s+mins:\s+(.+?)\s+(\d+-\d+)\s+(.+?)\s+(\d+-\d+)")
        .expect("minute score pattern is valid")
});

// "Kerry 1-03 Cavan 0-02"
static SCORE_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.+?)\s+(\d+-\d+)\s+(.+?)\s+(\d+-\d+)").expect("score pair pattern is valid")
});

pub fn scan_flags(text: &str) -> StateFlags {
    let lower = text.to_lowercase();
    let hit = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()))
    };
    StateFlags {
        is_final: hit(FULL_TIME_KEYWORDS),
        is_halftime: hit(HALF_TIME_KEYWORDS),
    }
}

pub trait ExtractionRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_extract(
        &self,
        text: &str,
        flags: StateFlags,
        extracted_at: DateTime<Utc>,
    ) -> Option<MatchEvent>;

    /// True when `text` has this rule's shape even if `try_extract` could not build an event
    /// from it. Such a fragment is dropped rather than handed to later rules.
    fn claims(&self, _text: &str) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct MinuteScoreRule;

impl ExtractionRule for MinuteScoreRule {
    fn name(&self) -> &'static str {
        "minute-score"
    }

    fn try_extract(
        &self,
        text: &str,
        flags: StateFlags,
        extracted_at: DateTime<Utc>,
    ) -> Option<MatchEvent> {
        let caps = MINUTE_SCORE_RE.captures(text)?;
        let base = caps.get(1)?.as_str().parse::<u32>().ok()?;
        let extra = match caps.get(2) {
            Some(m) => m.as_str().parse::<u32>().ok()?,
            None => 0,
        };
        let minute = base.checked_add(extra)?;
        scoring_event(&caps, 3, Some(minute), flags, extracted_at)
    }

    fn claims(&self, text: &str) -> bool {
        MINUTE_SCORE_RE.is_match(text)
    }
}

/// Rules B and C: a bare `<home> <score> <away> <score>` line, no minute.
///
/// The feed parser has always carried two rules with this exact pattern. They are kept as
/// separate entries so either can be tightened on its own; with identical patterns the
/// second one never fires.
#[derive(Debug)]
pub struct ScorePairRule {
    name: &'static str,
}

impl ScorePairRule {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl ExtractionRule for ScorePairRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(
        &self,
        text: &str,
        flags: StateFlags,
        extracted_at: DateTime<Utc>,
    ) -> Option<MatchEvent> {
        let caps = SCORE_PAIR_RE.captures(text)?;
        scoring_event(&caps, 1, None, flags, extracted_at)
    }
}

// Groups from `first` on are: home, home score, away, away score.
fn scoring_event(
    caps: &Captures<'_>,
    first: usize,
    minute: Option<u32>,
    flags: StateFlags,
    extracted_at: DateTime<Utc>,
) -> Option<MatchEvent> {
    let home = clean_team_name(caps.get(first)?.as_str());
    let home_score = caps.get(first + 1)?.as_str().to_string();
    let away = clean_team_name(caps.get(first + 2)?.as_str());
    let away_score = caps.get(first + 3)?.as_str().to_string();
    if home.is_empty() || away.is_empty() {
        return None;
    }
    Some(MatchEvent {
        minute,
        home_team: Some(home),
        away_team: Some(away),
        home_score: Some(home_score),
        away_score: Some(away_score),
        is_final: flags.is_final,
        is_halftime: flags.is_halftime,
        extracted_at,
    })
}

pub struct Extractor {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::standard()
    }
}

impl Extractor {
    pub fn standard() -> Self {
        Self::with_rules(vec![
            Box::new(MinuteScoreRule),
            Box::new(ScorePairRule::new("score-pair")),
            Box::new(ScorePairRule::new("score-pair-secondary")),
        ])
    }

    pub fn with_rules(rules: Vec<Box<dyn ExtractionRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn extract(&self, text: &str) -> Option<MatchEvent> {
        self.extract_at(text, Utc::now())
    }

    pub fn extract_at(&self, text: &str, extracted_at: DateTime<Utc>) -> Option<MatchEvent> {
        self.extract_traced(text, extracted_at).map(|(_, ev)| ev)
    }

    pub fn extract_traced(
        &self,
        text: &str,
        extracted_at: DateTime<Utc>,
    ) -> Option<(&'static str, MatchEvent)> {
        let flags = scan_flags(text);
        for rule in &self.rules {
            if let Some(event) = rule.try_extract(text, flags, extracted_at) {
                return Some((rule.name(), event));
            }
            if rule.claims(text) {
                debug!(rule = rule.name(), "fragment matched but could not be converted");
                return None;
            }
        }
        if flags.is_halftime {
            return Some(("halftime-marker", MatchEvent::marker(flags, extracted_at)));
        }
        None
    }
}
