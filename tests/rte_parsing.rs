use std::fs;
use std::path::PathBuf;

use gaa_live::config::DEFAULT_TITLE_KEYWORDS;
use gaa_live::extract::Extractor;
use gaa_live::normalize::normalize_fragment;
use gaa_live::rte_source::{collect_update_fragments, discover_live_articles};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn keywords() -> Vec<String> {
    DEFAULT_TITLE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

#[test]
fn discovers_live_articles_on_section_page() {
    let html = read_fixture("section.html");
    let urls = discover_live_articles(&html, "https://www.rte.ie/sport/football/", &keywords());
    assert_eq!(
        urls,
        vec![
            "https://www.rte.ie/sport/football/2025/0727/live-kerry-donegal-all-ireland-final/",
            "https://www.rte.ie/sport/hurling/2025/0720/live-cork-tipperary/",
        ]
    );
}

#[test]
fn section_page_without_cards_is_empty() {
    let urls = discover_live_articles("<html><body></body></html>", "https://www.rte.ie/", &keywords());
    assert!(urls.is_empty());
}

#[test]
fn collects_post_bodies_in_page_order() {
    let html = read_fixture("article.html");
    let fragments: Vec<_> = collect_update_fragments(&html)
        .iter()
        .map(|raw| normalize_fragment(raw))
        .collect();
    assert_eq!(
        fragments,
        vec![
            "5 mins: Kerry 0-02 Donegal 0-01",
            "12 mins:\nKerry 0-04 Donegal 0-03",
            "Half-time",
            "70+3 mins: Kerry 1-15 Donegal 0-13",
        ]
    );
}

#[test]
fn paragraphs_stay_on_separate_lines() {
    let html = r#"<div class="tracker-post-body"><p>Point for Kerry!</p><p>Kerry 1-03 Cavan 0-02</p></div>"#;
    let fragments = collect_update_fragments(html);
    assert_eq!(fragments.len(), 1);
    let text = normalize_fragment(&fragments[0]);
    assert_eq!(text, "Point for Kerry!\nKerry 1-03 Cavan 0-02");

    let ev = Extractor::standard().extract(&text).expect("event");
    assert_eq!(ev.home_team.as_deref(), Some("Kerry"));
    assert_eq!(ev.away_team.as_deref(), Some("Cavan"));
}

#[test]
fn collected_fragments_extract_cleanly() {
    let html = read_fixture("article.html");
    let extractor = Extractor::standard();
    let minutes: Vec<_> = collect_update_fragments(&html)
        .iter()
        .filter_map(|raw| extractor.extract(&normalize_fragment(raw)))
        .map(|ev| ev.minute)
        .collect();
    assert_eq!(minutes, vec![Some(5), Some(12), None, Some(73)]);
}
