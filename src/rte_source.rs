//! Live-blog source for RTÉ sport section pages.
//!
//! A section page lists articles as `<a href=..><span title="..">` cards. Cards whose title
//! mentions one of the live keywords are followed, and each post body on the article page
//! becomes one fragment. Only the server-rendered HTML is read, so posts hidden behind
//! "Show More" are not collected.

use std::collections::{HashSet, VecDeque};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::http_client::{fetch_html, http_client};
use crate::source::{ArticleFragments, FragmentSource};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector is valid"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[title]").expect("title selector is valid"));
static UPDATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".tracker-post-body, .live-update, .match-update")
        .expect("update selector is valid")
});

/// Article links on a section page whose card title contains any keyword
/// (case-insensitive). Relative links are resolved against `base_url`; order is kept and
/// repeats dropped.
pub fn discover_live_articles(html: &str, base_url: &str, keywords: &[String]) -> Vec<String> {
    let base = Url::parse(base_url).ok();
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let is_live = link.select(&TITLE_SELECTOR).any(|span| {
            span.value()
                .attr("title")
                .is_some_and(|title| title_is_live(title, keywords))
        });
        if !is_live {
            continue;
        }
        let Some(resolved) = resolve_href(base.as_ref(), href) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            out.push(resolved);
        }
    }
    out
}

pub fn title_is_live(title: &str, keywords: &[String]) -> bool {
    let lower = title.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "br", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr",
];

/// Text of every live-update post on an article page, in document order. Block elements
/// inside a post start a new line.
pub fn collect_update_fragments(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&UPDATE_SELECTOR)
        .map(post_text)
        .filter(|text| !text.trim().is_empty())
        .collect()
}

fn post_text(post: ElementRef<'_>) -> String {
    let mut out = String::new();
    // First node is the post element itself.
    for node in post.descendants().skip(1) {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }
    out
}

pub struct RteSource {
    client: &'static Client,
    listings: VecDeque<String>,
    articles: VecDeque<String>,
    seen: HashSet<String>,
    keywords: Vec<String>,
    remaining: usize,
}

impl RteSource {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = http_client(&config.http)?;
        Ok(Self {
            client,
            listings: config.source_urls.iter().cloned().collect(),
            articles: VecDeque::new(),
            seen: HashSet::new(),
            keywords: config.title_keywords.clone(),
            remaining: config.max_articles,
        })
    }

    fn refill(&mut self) -> Option<Result<()>> {
        while self.articles.is_empty() {
            let listing = self.listings.pop_front()?;
            info!(url = %listing, "scanning section page");
            let html = match fetch_html(self.client, &listing) {
                Ok(html) => html,
                Err(err) => {
                    return Some(Err(err.context(format!("section page {listing}"))));
                }
            };
            let found = discover_live_articles(&html, &listing, &self.keywords);
            info!(url = %listing, count = found.len(), "live articles found");
            for url in found {
                if self.seen.insert(url.clone()) {
                    self.articles.push_back(url);
                }
            }
        }
        Some(Ok(()))
    }
}

impl FragmentSource for RteSource {
    fn next_article(&mut self) -> Option<Result<ArticleFragments>> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            match self.refill()? {
                Ok(()) => break,
                // A dead section page only loses that page's articles.
                Err(err) => warn!(error = %err, "section page skipped"),
            }
        }
        let url = self.articles.pop_front()?;
        self.remaining -= 1;
        let result = fetch_html(self.client, &url)
            .with_context(|| format!("article {url}"))
            .map(|html| {
                let fragments = collect_update_fragments(&html);
                debug!(url = %url, count = fragments.len(), "collected update fragments");
                ArticleFragments::new(url.clone(), fragments)
            });
        Some(result)
    }
}
