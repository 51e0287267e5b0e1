use crate::event::{MatchEvent, MatchKey, Skip};

/// Work out which match an event belongs to.
///
/// Scoring events are keyed by their team names. A half-time marker has no teams, so it is
/// attached to `most_recent`, the match most recently added to this run. With several live
/// matches interleaved in one feed this can pick the wrong one; there is nothing in the
/// marker text to do better.
pub fn resolve_key(event: &MatchEvent, most_recent: Option<&MatchKey>) -> Result<MatchKey, Skip> {
    if let (Some(home), Some(away)) = (event.home_team.as_deref(), event.away_team.as_deref()) {
        return Ok(MatchKey::from_teams(home, away));
    }
    if event.is_marker() && event.is_halftime {
        return most_recent.cloned().ok_or(Skip::UnattributableMarker);
    }
    Err(Skip::Unidentified)
}
