// src/text.rs
//! Shared text helpers: folding for matching, whitespace cleanup, URL handling,
//! title casing and display truncation.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("url regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Particles kept lower-case inside title-cased names ("Cruz de la Torre").
const LOWER_PARTICLES: &[&str] = &["de", "del", "la", "las", "los", "y"];

/// Collapse runs of whitespace into one space and trim.
pub fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").into_owned()
}

/// Matching form: uppercase, diacritics removed, whitespace collapsed.
/// "José  Pérez" -> "JOSE PEREZ".
pub fn fold(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    collapse_ws(&stripped).to_uppercase()
}

/// Like [`fold`], but every non-alphanumeric char becomes a word break.
/// Used for keyword containment checks on whole words.
pub fn fold_words(s: &str) -> String {
    let folded = fold(s);
    let spaced: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_ws(&spaced)
}

/// Whole-word containment on already folded inputs.
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let h = format!(" {haystack} ");
    let n = format!(" {needle} ");
    h.contains(n.as_str())
}

/// All URLs in order of appearance, with trailing punctuation trimmed.
pub fn find_urls(s: &str) -> Vec<String> {
    RE_URL
        .find_iter(s)
        .map(|m| trim_url(m.as_str()).to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

/// Remove every URL from `s`.
pub fn strip_urls(s: &str) -> String {
    RE_URL.replace_all(s, " ").into_owned()
}

fn trim_url(u: &str) -> &str {
    u.trim_end_matches(|c: char| matches!(c, ')' | ']' | '.' | ',' | ';' | '>' | '"' | '\''))
}

/// "JOHN DE LA CRUZ" -> "John de la Cruz".
pub fn title_case(s: &str) -> String {
    collapse_ws(s)
        .split(' ')
        .enumerate()
        .map(|(i, w)| {
            let lower = w.to_lowercase();
            if i > 0 && LOWER_PARTICLES.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cap `s` at `max` chars, appending an ellipsis when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

/// Short stable hash for log correlation; never log raw post text.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
