// src/ingest/header.rs
//! Header grammar: `[icon] ACTOR[, ACTOR…] / [ACTOR /…] [SCOPE /] OUTLET`.
//!
//! The first non-blank line of a post is the header. Parsing dispatches on the
//! number of slash-separated tokens; fewer than two means the post is not a
//! column at all.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Catalog;
use crate::text::{collapse_ws, strip_urls};

/// Separators between several actors inside one header token.
static RE_ACTOR_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[,&/–—-]\s*|\s+[ye]\s+").expect("actor split regex"));

const VARIATION_SELECTOR: char = '\u{FE0F}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderParse {
    Parsed {
        actor_chunks: Vec<String>,
        scope: Option<String>,
        outlet: String,
    },
    Unrecognized,
}

/// First non-blank line of `text`.
pub fn header_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

pub fn parse_header(line: &str, catalog: &Catalog) -> HeaderParse {
    let rest = strip_leading_icons(line, catalog);
    let rest = strip_urls(rest);

    let tokens: Vec<String> = rest
        .split('/')
        .map(|t| collapse_ws(t).to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    let (middle, outlet) = match tokens.split_last() {
        Some((outlet, middle)) if !middle.is_empty() => (middle, outlet.clone()),
        _ => return HeaderParse::Unrecognized,
    };

    let (actor_tokens, scope) = match middle {
        // [a, outlet]: `a` is either the only actor or a bare scope.
        [only] if catalog.is_scope(only) => (&middle[..0], Some(only.clone())),
        [_] => (middle, None),
        // [actors…, maybe-scope, outlet]
        [head @ .., last] if catalog.is_scope(last) => (head, Some(last.clone())),
        _ => (middle, None),
    };

    let actor_chunks = actor_tokens
        .iter()
        .flat_map(|t| split_actor_chunk(t))
        .collect();

    HeaderParse::Parsed {
        actor_chunks,
        scope,
        outlet,
    }
}

/// "GOBERNADORA Y ALCALDE, FISCAL" -> ["GOBERNADORA", "ALCALDE", "FISCAL"].
pub fn split_actor_chunk(chunk: &str) -> Vec<String> {
    RE_ACTOR_SPLIT
        .split(chunk)
        .map(collapse_ws)
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn strip_leading_icons<'a>(line: &'a str, catalog: &Catalog) -> &'a str {
    let markers = &catalog.markers;
    let all = markers
        .alert
        .iter()
        .chain(&markers.negative)
        .chain(&markers.neutral)
        .chain(&markers.positive);

    let mut rest = line.trim_start();
    'outer: loop {
        rest = rest.trim_start_matches(|c: char| c == VARIATION_SELECTOR || c.is_whitespace());
        for m in all.clone() {
            if !m.is_empty() {
                if let Some(stripped) = rest.strip_prefix(m.as_str()) {
                    rest = stripped;
                    continue 'outer;
                }
            }
        }
        return rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
scopes = ["STATE", "ESTATAL", "MUNICIPAL"]
[aliases]
"John Smith" = ["SMITH"]
"#,
        )
        .unwrap()
    }

    fn parsed(chunks: &[&str], scope: Option<&str>, outlet: &str) -> HeaderParse {
        HeaderParse::Parsed {
            actor_chunks: chunks.iter().map(|s| s.to_string()).collect(),
            scope: scope.map(str::to_string),
            outlet: outlet.to_string(),
        }
    }

    #[test]
    fn three_tokens_with_scope() {
        let c = catalog();
        assert_eq!(
            parse_header("🔴 SMITH / STATE / DAILY NEWS", &c),
            parsed(&["SMITH"], Some("STATE"), "DAILY NEWS")
        );
    }

    #[test]
    fn three_tokens_without_scope_are_two_actors() {
        let c = catalog();
        assert_eq!(
            parse_header("Smith / Roe / Daily News", &c),
            parsed(&["SMITH", "ROE"], None, "DAILY NEWS")
        );
    }

    #[test]
    fn two_tokens_actor_and_outlet() {
        let c = catalog();
        assert_eq!(
            parse_header("⚠️ smith / omnia", &c),
            parsed(&["SMITH"], None, "OMNIA")
        );
    }

    #[test]
    fn two_tokens_scope_only_yields_no_actors() {
        let c = catalog();
        assert_eq!(
            parse_header("🟡 MUNICIPAL / OMNIA", &c),
            parsed(&[], Some("MUNICIPAL"), "OMNIA")
        );
    }

    #[test]
    fn four_tokens_split_multi_actor_chunks() {
        let c = catalog();
        assert_eq!(
            parse_header("🟢 Smith, Roe y Doe / Poe - Lee / estatal / El Diario", &c),
            parsed(&["SMITH", "ROE", "DOE", "POE", "LEE"], Some("ESTATAL"), "EL DIARIO")
        );
    }

    #[test]
    fn fewer_than_two_tokens_is_unrecognized() {
        let c = catalog();
        assert_eq!(parse_header("Just a sentence", &c), HeaderParse::Unrecognized);
        assert_eq!(parse_header("🔴 / OMNIA /", &c), HeaderParse::Unrecognized);
        assert_eq!(parse_header("   ", &c), HeaderParse::Unrecognized);
    }

    #[test]
    fn bare_url_line_is_not_a_header() {
        let c = catalog();
        assert_eq!(
            parse_header("https://example.com/a/b/c", &c),
            HeaderParse::Unrecognized
        );
    }

    #[test]
    fn header_line_skips_blank_lines() {
        assert_eq!(header_line("\n\n  A / B  \nbody"), Some("A / B"));
        assert_eq!(header_line("  \n "), None);
    }
}
