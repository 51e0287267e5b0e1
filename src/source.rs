use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFragments {
    pub url: String,
    #[serde(default)]
    pub fragments: Vec<String>,
    /// Set when collection stopped part-way; `fragments` holds what was read before that.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
}

impl ArticleFragments {
    pub fn new(url: impl Into<String>, fragments: Vec<String>) -> Self {
        Self {
            url: url.into(),
            fragments,
            interrupted: None,
        }
    }
}

/// Supplier of article fragments for one run. `Some(Err(..))` means one article could not
/// be read; callers skip it and keep pulling.
pub trait FragmentSource {
    fn next_article(&mut self) -> Option<Result<ArticleFragments>>;
}

#[derive(Debug, Default)]
pub struct VecSource {
    items: VecDeque<Result<ArticleFragments>>,
}

impl VecSource {
    pub fn new(articles: Vec<ArticleFragments>) -> Self {
        Self {
            items: articles.into_iter().map(Ok).collect(),
        }
    }

    pub fn from_results(items: Vec<Result<ArticleFragments>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl FragmentSource for VecSource {
    fn next_article(&mut self) -> Option<Result<ArticleFragments>> {
        self.items.pop_front()
    }
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    articles: Vec<ArticleFragments>,
}

/// Articles captured earlier into a JSON file: `{"articles": [{"url": .., "fragments": [..]}]}`.
pub struct FixtureSource;

impl FixtureSource {
    pub fn load(path: &Path) -> Result<VecSource> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read fixture {}", path.display()))?;
        let articles = parse_fixture_json(&raw)?;
        Ok(VecSource::new(articles))
    }
}

pub fn parse_fixture_json(raw: &str) -> Result<Vec<ArticleFragments>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let file: FixtureFile = serde_json::from_str(trimmed).context("invalid fixture json")?;
    Ok(file.articles)
}

#[cfg(test)]
mod tests {
    use super::{parse_fixture_json, FragmentSource, VecSource};

    #[test]
    fn fixture_null_is_empty() {
        assert!(parse_fixture_json("null").expect("null").is_empty());
        assert!(parse_fixture_json("  ").expect("blank").is_empty());
    }

    #[test]
    fn fixture_defaults_missing_fragments() {
        let raw = r#"{"articles":[{"url":"https://example.ie/a"}]}"#;
        let articles = parse_fixture_json(raw).expect("parse");
        assert_eq!(articles.len(), 1);
        assert!(articles[0].fragments.is_empty());
        assert!(articles[0].interrupted.is_none());
    }

    #[test]
    fn vec_source_drains_in_order() {
        let raw = r#"{"articles":[{"url":"a","fragments":["x"]},{"url":"b","fragments":[]}]}"#;
        let mut src = VecSource::new(parse_fixture_json(raw).expect("parse"));
        assert_eq!(src.next_article().expect("a").expect("ok").url, "a");
        assert_eq!(src.next_article().expect("b").expect("ok").url, "b");
        assert!(src.next_article().is_none());
    }
}
