use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags {
    pub is_final: bool,
    pub is_halftime: bool,
}

/// Scores are carried as the raw `"<goals>-<points>"` text and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub minute: Option<u32>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub is_final: bool,
    pub is_halftime: bool,
    pub extracted_at: DateTime<Utc>,
}

impl MatchEvent {
    pub fn marker(flags: StateFlags, extracted_at: DateTime<Utc>) -> Self {
        Self {
            minute: None,
            home_team: None,
            away_team: None,
            home_score: None,
            away_score: None,
            is_final: flags.is_final,
            is_halftime: flags.is_halftime,
            extracted_at,
        }
    }

    pub fn is_scoring(&self) -> bool {
        self.home_team.is_some() && self.away_team.is_some()
    }

    pub fn is_marker(&self) -> bool {
        self.home_team.is_none() && self.away_team.is_none()
    }

    pub fn sort_minute(&self) -> u32 {
        self.minute.unwrap_or(0)
    }
}

/// `"<home> vs <away>"` exactly as extracted; no case folding or aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn from_teams(home: &str, away: &str) -> Self {
        Self(format!("{home} vs {away}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Why a fragment or event was dropped. None of these are errors: they are counted and the
/// run carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skip {
    ParseMiss,
    UnattributableMarker,
    TemporalRegression,
    Unidentified,
}

impl Skip {
    pub fn label(self) -> &'static str {
        match self {
            Skip::ParseMiss => "parse_miss",
            Skip::UnattributableMarker => "unattributable_marker",
            Skip::TemporalRegression => "temporal_regression",
            Skip::Unidentified => "unidentified",
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
