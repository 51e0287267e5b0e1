use chrono::{DateTime, TimeZone, Utc};

use gaa_live::event::MatchEvent;
use gaa_live::extract::{Extractor, MinuteScoreRule, ScorePairRule, scan_flags};
use gaa_live::normalize::normalize_fragment;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 27, 15, 45, 0).unwrap()
}

fn extract(text: &str) -> Option<MatchEvent> {
    Extractor::standard().extract_at(&normalize_fragment(text), at())
}

#[test]
fn stoppage_time_is_added_to_minute() {
    let ev = extract("70+2 mins: Kerry 1-10 Dublin 0-09").expect("event");
    assert_eq!(ev.minute, Some(72));
    assert_eq!(ev.home_team.as_deref(), Some("Kerry"));
    assert_eq!(ev.home_score.as_deref(), Some("1-10"));
    assert_eq!(ev.away_team.as_deref(), Some("Dublin"));
    assert_eq!(ev.away_score.as_deref(), Some("0-09"));
    assert!(!ev.is_final);
    assert!(!ev.is_halftime);
}

#[test]
fn bare_pair_has_no_minute() {
    let ev = extract("Kerry 1-03 Cavan 0-02").expect("event");
    assert_eq!(ev.minute, None);
    assert_eq!(ev.home_team.as_deref(), Some("Kerry"));
    assert_eq!(ev.home_score.as_deref(), Some("1-03"));
    assert_eq!(ev.away_team.as_deref(), Some("Cavan"));
    assert_eq!(ev.away_score.as_deref(), Some("0-02"));
}

#[test]
fn team_name_does_not_reach_into_previous_line() {
    let ev = extract("Point for Kerry!\nKerry 1-03 Cavan 0-02").expect("event");
    assert_eq!(ev.home_team.as_deref(), Some("Kerry"));
    assert_eq!(ev.home_score.as_deref(), Some("1-03"));
    assert_eq!(ev.away_team.as_deref(), Some("Cavan"));
    assert_eq!(ev.minute, None);
}

#[test]
fn minute_on_its_own_line_still_counts() {
    let ev = extract("52 mins:\n  Kerry 1-07   Cavan 0-09").expect("event");
    assert_eq!(ev.minute, Some(52));
    assert_eq!(ev.home_team.as_deref(), Some("Kerry"));
}

#[test]
fn unconvertible_minute_is_dropped_not_read_as_pair() {
    assert!(extract("99999999999 mins: Kerry 1-10 Dublin 0-09").is_none());
    assert!(extract("4294967295+1 mins: Kerry 1-10 Dublin 0-09").is_none());
}

#[test]
fn minute_rule_wins_over_score_pair() {
    let text = "45 mins: Mayo 0-11 Galway 0-09";
    let (rule, ev) = Extractor::standard()
        .extract_traced(text, at())
        .expect("event");
    assert_eq!(rule, "minute-score");
    assert_eq!(ev.minute, Some(45));
    assert_eq!(ev.home_team.as_deref(), Some("Mayo"));

    // The bare rule on its own reads the minute prefix into the home name.
    let bare = Extractor::with_rules(vec![Box::new(ScorePairRule::new("score-pair"))])
        .extract_at(text, at())
        .expect("event");
    assert_eq!(bare.minute, None);
    assert_eq!(bare.home_team.as_deref(), Some("45 mins: Mayo"));
}

#[test]
fn standard_rule_order() {
    assert_eq!(
        Extractor::standard().rule_names(),
        vec!["minute-score", "score-pair", "score-pair-secondary"]
    );
}

#[test]
fn extraction_is_deterministic_apart_from_timestamp() {
    let text = "  • 33 mins:\n Limerick 1-12   Waterford 0-14 ";
    let a = Extractor::standard()
        .extract_at(&normalize_fragment(text), at())
        .expect("event");
    let b = Extractor::standard()
        .extract(&normalize_fragment(text))
        .expect("event");
    assert_eq!(a.minute, b.minute);
    assert_eq!(a.home_team, b.home_team);
    assert_eq!(a.away_team, b.away_team);
    assert_eq!(a.home_score, b.home_score);
    assert_eq!(a.away_score, b.away_score);
    assert_eq!(a.minute, Some(33));
}

#[test]
fn full_time_flag_rides_on_scoring_event() {
    let ev = extract("FT: Kerry 1-15 Donegal 0-13").expect("event");
    assert!(ev.is_final);
    assert_eq!(ev.minute, None);
    // "FT:" is part of the captured home name; the key keeps it as-is.
    assert_eq!(ev.home_team.as_deref(), Some("FT: Kerry"));
}

#[test]
fn halftime_without_score_becomes_marker() {
    let ev = extract("Half-time").expect("marker");
    assert!(ev.is_marker());
    assert!(ev.is_halftime);
    assert_eq!(ev.minute, None);
    assert_eq!(ev.extracted_at, at());
}

#[test]
fn full_time_alone_is_not_an_event() {
    assert!(extract("Full-time").is_none());
    assert!(extract("Wides are mounting for both sides").is_none());
}

#[test]
fn short_markers_match_inside_words() {
    let flags = scan_flags("A tight finish in Thurles");
    assert!(flags.is_halftime);
    let flags = scan_flags("Soft free after a push");
    assert!(flags.is_final);
}

#[test]
fn custom_rule_list_is_respected() {
    let only_minutes = Extractor::with_rules(vec![Box::new(MinuteScoreRule)]);
    assert!(only_minutes.extract_at("Kerry 1-03 Cavan 0-02", at()).is_none());
    assert!(
        only_minutes
            .extract_at("3 mins: Kerry 0-01 Cavan 0-00", at())
            .is_some()
    );
}
