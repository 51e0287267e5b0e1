// Cleanup applied to raw tracker text before any pattern matching.

/// Characters that live blogs put in front of a post (bullets, separators, quote marks).
const PREFIX_NOISE: &[char] = &['•', '·', '|', '>', '*', '–', '—', '-', '»'];

/// Decode the common entities, collapse blank runs inside each line, drop empty lines and
/// leading bullet noise. Line breaks survive: team captures must not reach into the line
/// before the score.
pub fn normalize_fragment(raw: &str) -> String {
    let decoded = normalize_entities(raw);
    let collapsed = normalize_ws(&decoded);
    strip_prefix_noise(&collapsed).to_string()
}

/// Minimal HTML entity decoding for text pulled out of rendered pages.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    s.lines()
        .map(collapse_line)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_space = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

fn strip_prefix_noise(s: &str) -> &str {
    s.trim_start_matches(|ch: char| ch.is_whitespace() || PREFIX_NOISE.contains(&ch))
}

/// Team names are stored trimmed.
pub fn clean_team_name(raw: &str) -> String {
    raw.trim().to_string()
}
