// src/ingest/mod.rs
//! Ingestion pipeline: raw post -> header parse -> severity -> actors ->
//! dedup key -> entry store.

pub mod actors;
pub mod dedup;
pub mod header;
pub mod severity;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::config::Catalog;
use crate::entry::{ActorName, Entry, NO_OUTLET};
use crate::ingest::header::{header_line, parse_header, HeaderParse};
use crate::report::ReportRenderer;
use crate::store::EntryStore;
use crate::text::{anon_hash, collapse_ws, find_urls, fold};

/// Leading list/bullet markers stripped from body lines.
const BULLETS: &[char] = &['•', '·', '▪', '►', '▶', '➡', '-', '*', '–', '—', '>', '\u{FE0F}'];

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("columns_ingested_total", "Columns stored after dedup.");
        describe_counter!(
            "columns_duplicate_total",
            "Posts dropped because their dedup key was already stored."
        );
        describe_counter!(
            "columns_unrecognized_total",
            "Posts without a parseable column header."
        );
        describe_counter!(
            "columns_backdated_total",
            "Columns whose receive time predated the newest stored entry."
        );
        describe_gauge!("entry_store_size", "Entries currently held in memory.");
    });
}

/// Decode entities, collapse whitespace, drop leading bullets and icons.
pub fn clean_body_line(line: &str, catalog: &Catalog) -> String {
    let decoded = html_escape::decode_html_entities(line).to_string();
    let mut rest = decoded.as_str();
    loop {
        let before = rest.len();
        rest = header::strip_leading_icons(rest, catalog);
        rest = rest.trim_start_matches(|c: char| BULLETS.contains(&c) || c.is_whitespace());
        if rest.len() == before {
            break;
        }
    }
    collapse_ws(rest)
}

/// Owns the parse/classify/canonicalize/dedup sequence over a shared store.
#[derive(Debug, Clone)]
pub struct ColumnPipeline {
    catalog: Arc<Catalog>,
    store: Arc<EntryStore>,
}

impl ColumnPipeline {
    pub fn new(catalog: Arc<Catalog>, store: Arc<EntryStore>) -> Self {
        ensure_metrics_described();
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// Full pipeline. Returns the stored entry, or `None` when the post is
    /// not a column or is a repost of a stored one.
    pub fn ingest(&self, raw_text: &str, received_at: DateTime<Utc>) -> Option<Entry> {
        let Some(entry) = self.parse(raw_text, received_at) else {
            counter!("columns_unrecognized_total").increment(1);
            tracing::debug!(target: "ingest", post = %anon_hash(raw_text), "not a column");
            return None;
        };

        let id_hash = anon_hash(&entry.id);
        let Some(stored) = self.store.insert(entry) else {
            counter!("columns_duplicate_total").increment(1);
            tracing::debug!(target: "ingest", id = %id_hash, "duplicate column dropped");
            return None;
        };

        if stored.timestamp != received_at {
            counter!("columns_backdated_total").increment(1);
            tracing::warn!(
                target: "ingest",
                id = %id_hash,
                %received_at,
                stored_at = %stored.timestamp,
                "receive time older than newest entry; timestamp raised"
            );
        }

        counter!("columns_ingested_total").increment(1);
        gauge!("entry_store_size").set(self.store.len() as f64);
        tracing::info!(
            target: "ingest",
            id = %id_hash,
            severity = %stored.severity,
            actors = stored.actors.len(),
            outlet = %stored.outlet,
            "column stored"
        );
        Some(stored)
    }

    pub fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Entry> {
        self.store.query_range(start, end)
    }

    pub fn build_report(&self, entries: &[Entry], title: &str) -> String {
        ReportRenderer::new(Arc::clone(&self.catalog)).render(entries, title)
    }

    /// Build an entry without touching the store.
    pub fn parse(&self, raw_text: &str, received_at: DateTime<Utc>) -> Option<Entry> {
        let catalog = &*self.catalog;
        let header = header_line(raw_text)?;
        let HeaderParse::Parsed {
            actor_chunks,
            scope,
            outlet,
        } = parse_header(header, catalog)
        else {
            return None;
        };

        let severity = severity::classify(raw_text, &catalog.markers);

        let mut actors: Vec<ActorName> = Vec::with_capacity(actor_chunks.len());
        for chunk in &actor_chunks {
            if let Some(actor) = actors::canonicalize(chunk, catalog) {
                if !actors.contains(&actor) {
                    actors.push(actor);
                }
            }
        }
        if actors.is_empty() {
            actors.push(ActorName::others());
        }

        let link = dedup::trailing_url(raw_text);
        let outlet = self.resolve_outlet(&outlet, link.as_deref());
        let body = self.body_of(raw_text);
        let id = dedup::dedup_key(link.as_deref(), &outlet, header, &body);

        Some(Entry {
            id,
            timestamp: received_at,
            severity,
            actors,
            scope: scope.unwrap_or_default(),
            outlet,
            body,
            link: link.unwrap_or_default(),
        })
    }

    /// Everything below the header; lines that are nothing but a link are dropped.
    fn body_of(&self, raw_text: &str) -> String {
        let lines = raw_text
            .lines()
            .map(str::trim)
            .skip_while(|l| l.is_empty())
            .skip(1)
            .filter(|l| !is_link_only(l))
            .map(|l| clean_body_line(l, &self.catalog))
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        collapse_ws(&lines.join(" "))
    }

    /// Header token -> outlet alias; empty token -> link host; else `NO OUTLET`.
    fn resolve_outlet(&self, token: &str, link: Option<&str>) -> String {
        let cleaned = collapse_ws(
            token.trim_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace()),
        )
        .to_uppercase();

        if !cleaned.is_empty() {
            return match self.catalog.outlet_alias(&fold(&cleaned)) {
                Some(canon) => canon.to_string(),
                None => cleaned,
            };
        }

        link.and_then(|l| self.outlet_from_link(l))
            .unwrap_or_else(|| NO_OUTLET.to_string())
    }

    fn outlet_from_link(&self, link: &str) -> Option<String> {
        let url = reqwest::Url::parse(link).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(host.as_str());
        match self.catalog.outlet_for_host(host) {
            Some(name) => Some(name.to_string()),
            None => Some(host.to_uppercase()),
        }
    }
}

fn is_link_only(line: &str) -> bool {
    let urls = find_urls(line);
    !urls.is_empty() && collapse_ws(&crate::text::strip_urls(line)).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Severity, OTHERS_OF_INTEREST};
    use chrono::TimeZone;

    const CATALOG: &str = r#"
scopes = ["STATE", "ESTATAL"]
roles = ["MAYOR"]
[aliases]
"John Smith" = ["SMITH"]
[outlets]
"DAILY NEWS" = ["THE DAILY NEWS"]
[outlet_hosts]
"omnia" = "OMNIA"
"#;

    fn pipeline() -> ColumnPipeline {
        let catalog = Arc::new(Catalog::from_toml_str(CATALOG).unwrap());
        ColumnPipeline::new(catalog, Arc::new(EntryStore::new()))
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap()
    }

    #[test]
    fn clean_body_line_strips_markers() {
        let p = pipeline();
        assert_eq!(clean_body_line("  • 🔴 Texto &amp; más  ", p.catalog()), "Texto & más");
        assert_eq!(clean_body_line("- - item", p.catalog()), "item");
    }

    #[test]
    fn parse_builds_full_entry() {
        let p = pipeline();
        let raw = "🔴 Mayor Smith, Jane Roe / STATE / The Daily News\n• Body text about a scandal.\nhttps://example.com/a";
        let e = p.parse(raw, at()).unwrap();
        assert_eq!(e.id, "https://example.com/a");
        assert_eq!(e.severity, Severity::Negative);
        assert_eq!(
            e.actors,
            vec![ActorName::new("John Smith"), ActorName::new("Jane Roe")]
        );
        assert_eq!(e.scope, "STATE");
        assert_eq!(e.outlet, "DAILY NEWS");
        assert_eq!(e.body, "Body text about a scandal.");
        assert_eq!(e.link, "https://example.com/a");
    }

    #[test]
    fn repeated_actor_is_kept_once() {
        let p = pipeline();
        let e = p.parse("SMITH, Mayor Smith / OMNIA", at()).unwrap();
        assert_eq!(e.actors, vec![ActorName::new("John Smith")]);
    }

    #[test]
    fn scope_only_header_falls_back_to_sentinel_actor() {
        let p = pipeline();
        let e = p.parse("🟡 ESTATAL / OMNIA\ntexto", at()).unwrap();
        assert_eq!(e.actors, vec![ActorName::new(OTHERS_OF_INTEREST)]);
        assert_eq!(e.scope, "ESTATAL");
    }

    #[test]
    fn punctuation_outlet_uses_link_host() {
        let p = pipeline();
        let e = p
            .parse("SMITH / -\ntexto\nhttps://www.omnia.com.mx/nota/1", at())
            .unwrap();
        assert_eq!(e.outlet, "OMNIA");
        let e = p.parse("SMITH / -\ntexto", at()).unwrap();
        assert_eq!(e.outlet, NO_OUTLET);
    }

    #[test]
    fn ingest_drops_reposts_and_non_columns() {
        let p = pipeline();
        assert!(p.ingest("just chatting", at()).is_none());
        assert!(p
            .ingest("SMITH / OMNIA\nuno\nhttps://x.com/1", at())
            .is_some());
        assert!(p
            .ingest("OMNIA / SMITH\ndos\nhttps://x.com/1", at())
            .is_none());
        assert_eq!(p.store().len(), 1);
    }

    #[test]
    fn backdated_post_is_stored_at_newest_time() {
        let p = pipeline();
        let day2 = at() + chrono::Duration::days(1);
        p.ingest("SMITH / OMNIA\nsegundo dia", day2).unwrap();
        let late = p.ingest("SMITH / OMNIA\nprimer dia", at()).unwrap();
        assert_eq!(late.timestamp, day2);
        assert!(p.query_range(at(), at() + chrono::Duration::hours(1)).is_empty());
        assert_eq!(p.query_range(day2, day2).len(), 2);
    }

    #[test]
    fn range_before_all_entries_reports_nothing() {
        let p = pipeline();
        p.ingest("🔴 SMITH / OMNIA\ntexto\nhttps://x.com/1", at()).unwrap();
        let early = at() - chrono::Duration::days(2);
        let subset = p.query_range(early, early + chrono::Duration::hours(1));
        assert!(subset.is_empty());
        assert_eq!(
            p.build_report(&subset, "T"),
            crate::report::EMPTY_PERIOD_MESSAGE
        );
    }

    #[test]
    fn linkless_reposts_collapse_by_digest() {
        let p = pipeline();
        let raw = "SMITH / OMNIA\nsame forwarded text";
        assert!(p.ingest(raw, at()).is_some());
        assert!(p.ingest(raw, at()).is_none());
        assert!(p.ingest("SMITH / OMNIA\nother text", at()).is_some());
    }
}
