use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "gaa_live";
const DB_FILE: &str = "live_scores.sqlite";

pub const DEFAULT_SOURCE_URLS: &[&str] = &[
    "https://www.rte.ie/sport/football/",
    "https://www.rte.ie/sport/hurling/",
];
pub const DEFAULT_TITLE_KEYWORDS: &[&str] = &["live", "recap", "updates", "minute", "score"];
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub source_urls: Vec<String>,
    pub title_keywords: Vec<String>,
    pub max_articles: usize,
    pub db_path: Option<PathBuf>,
    pub http: HttpSettings,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_current_env()
    }

    pub fn from_current_env() -> Self {
        let source_urls = list_env("LIVE_SOURCE_URLS")
            .unwrap_or_else(|| DEFAULT_SOURCE_URLS.iter().map(|s| s.to_string()).collect());
        let title_keywords = list_env("LIVE_TITLE_KEYWORDS")
            .map(|v| v.into_iter().map(|k| k.to_lowercase()).collect())
            .unwrap_or_else(|| DEFAULT_TITLE_KEYWORDS.iter().map(|s| s.to_string()).collect());
        let max_articles = env::var("LIVE_MAX_ARTICLES")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(20)
            .clamp(1, 200);
        let timeout_secs = env::var("LIVE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(30)
            .clamp(5, 120);
        let user_agent = env::var("LIVE_USER_AGENT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let db_path = env::var("LIVE_DB_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_db_path);

        Self {
            source_urls,
            title_keywords,
            max_articles,
            db_path,
            http: HttpSettings {
                timeout: Duration::from_secs(timeout_secs),
                user_agent,
            },
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    // Prefer XDG data dir.
    if let Ok(base) = env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR),
    )
}

fn list_env(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let items = parse_list(&raw);
    if items.is_empty() { None } else { Some(items) }
}

pub fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if !part.is_empty() && !out.iter().any(|seen| seen == part) {
            out.push(part.to_string());
        }
    }
    out
}

/// Value of `--flag=PATH` or `--flag PATH` from the command line.
pub fn flag_path(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
