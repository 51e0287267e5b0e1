use std::collections::HashMap;

use crate::event::{MatchEvent, MatchKey, Skip};
use crate::match_key::resolve_key;

#[derive(Debug, Clone)]
pub struct Timeline {
    key: MatchKey,
    events: Vec<MatchEvent>,
    // Last accepted minute; `None` sits below every real minute.
    high_water: Option<u32>,
}

impl Timeline {
    pub fn new(key: MatchKey) -> Self {
        Self {
            key,
            events: Vec::new(),
            high_water: None,
        }
    }

    pub fn key(&self) -> &MatchKey {
        &self.key
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn high_water_minute(&self) -> Option<u32> {
        self.high_water
    }

    pub fn teams(&self) -> Option<(&str, &str)> {
        self.events.iter().find_map(|ev| {
            Some((ev.home_team.as_deref()?, ev.away_team.as_deref()?))
        })
    }

    pub fn offer(&mut self, event: MatchEvent) -> Result<(), Skip> {
        if let (Some(minute), Some(high)) = (event.minute, self.high_water)
            && minute < high
        {
            return Err(Skip::TemporalRegression);
        }
        if let Some(minute) = event.minute {
            self.high_water = Some(minute);
        }
        self.events.push(event);
        Ok(())
    }
}

/// Per-run map from match key to timeline. Iteration follows the order in which matches were
/// first seen, and the last of them is where key-less half-time markers go.
#[derive(Debug, Default)]
pub struct Aggregator {
    timelines: Vec<Timeline>,
    index: HashMap<MatchKey, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, event: MatchEvent) -> Result<MatchKey, Skip> {
        let key = resolve_key(&event, self.most_recent_key())?;
        let idx = match self.index.get(&key) {
            Some(idx) => *idx,
            None => {
                self.timelines.push(Timeline::new(key.clone()));
                let idx = self.timelines.len() - 1;
                self.index.insert(key.clone(), idx);
                idx
            }
        };
        self.timelines[idx].offer(event)?;
        Ok(key)
    }

    pub fn most_recent_key(&self) -> Option<&MatchKey> {
        self.timelines.last().map(Timeline::key)
    }

    pub fn get(&self, key: &MatchKey) -> Option<&Timeline> {
        self.index.get(key).map(|idx| &self.timelines[*idx])
    }

    pub fn keys(&self) -> impl Iterator<Item = &MatchKey> {
        self.timelines.iter().map(Timeline::key)
    }

    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn into_timelines(self) -> Vec<Timeline> {
        self.timelines
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{Aggregator, Timeline};
    use crate::event::{MatchEvent, MatchKey, Skip, StateFlags};

    fn at_minute(minute: Option<u32>) -> MatchEvent {
        MatchEvent {
            minute,
            home_team: Some("Galway".to_string()),
            away_team: Some("Mayo".to_string()),
            home_score: Some("0-05".to_string()),
            away_score: Some("0-04".to_string()),
            is_final: false,
            is_halftime: false,
            extracted_at: Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap(),
        }
    }

    #[test]
    fn equal_minute_is_accepted() {
        let mut t = Timeline::new(MatchKey::from("Galway vs Mayo"));
        t.offer(at_minute(Some(20))).expect("first");
        t.offer(at_minute(Some(20))).expect("same minute");
        assert_eq!(t.len(), 2);
        assert_eq!(t.high_water_minute(), Some(20));
    }

    #[test]
    fn minute_less_event_keeps_mark() {
        let mut t = Timeline::new(MatchKey::from("Galway vs Mayo"));
        t.offer(at_minute(Some(40))).expect("first");
        t.offer(at_minute(None)).expect("no minute");
        assert_eq!(t.high_water_minute(), Some(40));
        assert_eq!(t.offer(at_minute(Some(39))), Err(Skip::TemporalRegression));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn aggregator_tracks_first_seen_order() {
        let mut agg = Aggregator::new();
        let mut other = at_minute(Some(5));
        other.home_team = Some("Cork".to_string());
        other.away_team = Some("Clare".to_string());

        agg.ingest(at_minute(Some(3))).expect("galway");
        agg.ingest(other).expect("cork");
        agg.ingest(at_minute(Some(9))).expect("galway again");

        let keys: Vec<&str> = agg.keys().map(MatchKey::as_str).collect();
        assert_eq!(keys, vec!["Galway vs Mayo", "Cork vs Clare"]);
        assert_eq!(
            agg.most_recent_key().map(MatchKey::as_str),
            Some("Cork vs Clare")
        );

        let marker = MatchEvent::marker(
            StateFlags {
                is_final: false,
                is_halftime: true,
            },
            Utc::now() + Duration::seconds(1),
        );
        let key = agg.ingest(marker).expect("marker");
        assert_eq!(key.as_str(), "Cork vs Clare");
        let cork = agg.get(&key).expect("timeline");
        assert_eq!(cork.len(), 2);
        assert_eq!(cork.teams(), Some(("Cork", "Clare")));
    }
}
