use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{MatchEvent, MatchKey};
use crate::timeline::Timeline;

/// Pick the current event of a timeline: highest minute (missing minute counts as 0), then
/// latest extraction time. On a full tie the later entry in the timeline wins.
pub fn resolve_snapshot(timeline: &Timeline) -> Option<&MatchEvent> {
    latest_event(timeline.events())
}

pub fn latest_event(events: &[MatchEvent]) -> Option<&MatchEvent> {
    events
        .iter()
        .max_by(|a, b| (a.sort_minute(), a.extracted_at).cmp(&(b.sort_minute(), b.extracted_at)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub match_key: MatchKey,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub minute: Option<u32>,
    pub is_final: bool,
    pub is_halftime: bool,
    pub updated_at: DateTime<Utc>,
}

impl SnapshotRow {
    /// `None` for an empty timeline. When the chosen event is a marker, the team names come
    /// from the match itself and the scores stay empty.
    pub fn from_timeline(timeline: &Timeline) -> Option<Self> {
        let event = resolve_snapshot(timeline)?;
        let (home, away) = match timeline.teams() {
            Some((h, a)) => (Some(h.to_string()), Some(a.to_string())),
            None => (None, None),
        };
        Some(Self {
            match_key: timeline.key().clone(),
            home_team: event.home_team.clone().or(home),
            away_team: event.away_team.clone().or(away),
            home_score: event.home_score.clone(),
            away_score: event.away_score.clone(),
            minute: event.minute,
            is_final: event.is_final,
            is_halftime: event.is_halftime,
            updated_at: event.extracted_at,
        })
    }
}
