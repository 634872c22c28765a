// tests/column_scenarios.rs
//
// End-to-end behaviour of the pipeline through the public library API:
// ingest -> store -> range query -> report.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use column_digest::analyze::{extract_topics, TopicTier};
use column_digest::ingest::actors::canonicalize;
use column_digest::report::EMPTY_PERIOD_MESSAGE;
use column_digest::{ActorName, Catalog, ColumnPipeline, EntryStore, Severity};

const CATALOG: &str = r#"
scopes = ["STATE", "CITY"]
roles = ["MAYOR", "GOVERNOR"]
stopwords = ["the", "about", "and", "for", "new", "body", "text", "push"]

[aliases]
"John Smith" = ["SMITH", "J. SMITH"]
"#;

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_toml_str(CATALOG).expect("test catalog"))
}

fn pipeline() -> ColumnPipeline {
    ColumnPipeline::new(catalog(), Arc::new(EntryStore::new()))
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap()
}

#[test]
fn repost_with_same_link_is_one_negative_entry() {
    let p = pipeline();
    let raw = "🔴 SMITH / STATE / DAILY NEWS\nBody text\nhttps://example.com/a";

    let first = p.ingest(raw, t0()).expect("first post stored");
    assert!(p.ingest(raw, t0() + Duration::minutes(5)).is_none());

    assert_eq!(p.store().len(), 1);
    assert_eq!(first.severity, Severity::Negative);
    assert_eq!(first.scope, "STATE");
    assert_eq!(first.outlet, "DAILY NEWS");
    assert_eq!(first.actors, vec![ActorName::new("John Smith")]);
    assert_eq!(first.id, "https://example.com/a");
}

#[test]
fn role_prefixed_and_bare_names_share_one_identity() {
    let c = catalog();
    let a = canonicalize("Mayor Smith", &c).unwrap();
    let b = canonicalize("SMITH", &c).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "John Smith");
}

#[test]
fn alert_outranks_every_other_marker() {
    let p = pipeline();
    let e = p
        .ingest("🟢 ⚠️ 🔴 SMITH / CITY NEWS\nmixed signals", t0())
        .unwrap();
    assert_eq!(e.severity, Severity::Alert);
}

#[test]
fn single_token_header_is_not_a_column() {
    let p = pipeline();
    assert!(p.ingest("🔴 Breaking: nothing to see here\nmore text", t0()).is_none());
    assert!(p.store().is_empty());
}

#[test]
fn recurring_phrase_becomes_a_frequency_topic() {
    let p = pipeline();
    p.ingest("SMITH / DAILY NEWS\nBody text about border crossing reform.", t0())
        .unwrap();
    p.ingest(
        "GOVERNOR ROE / EVENING POST\nNew push for border crossing reform",
        t0() + Duration::minutes(1),
    )
    .unwrap();

    let entries = p.query_range(t0(), t0() + Duration::hours(1));
    let topics = extract_topics(&entries, p.catalog(), 5);
    let t = topics
        .iter()
        .find(|t| t.label.contains("border crossing"))
        .expect("border crossing topic");
    assert_eq!(t.entries, 2);
    assert_eq!(t.outlets, vec!["DAILY NEWS", "EVENING POST"]);
    assert_eq!(t.tier, TopicTier::Frequency);

    let report = p.build_report(&entries, "COLUMNS / test");
    assert!(report.contains("border crossing reform (2 entries)"));
    assert!(report.contains("- DAILY NEWS\n- EVENING POST"));
}

#[test]
fn range_before_any_entry_renders_empty_message() {
    let p = pipeline();
    p.ingest("SMITH / DAILY NEWS\nuno", t0()).unwrap();
    p.ingest("SMITH / EVENING POST\ndos", t0() + Duration::hours(1)).unwrap();

    let subset = p.query_range(t0() - Duration::days(3), t0() - Duration::days(2));
    assert!(subset.is_empty());
    assert_eq!(p.build_report(&subset, "COLUMNS / old"), EMPTY_PERIOD_MESSAGE);
}

#[test]
fn query_range_is_inclusive_and_ordered() {
    let p = pipeline();
    for (i, outlet) in ["A NEWS", "B NEWS", "C NEWS"].iter().enumerate() {
        p.ingest(&format!("SMITH / {outlet}\nn{i}"), t0() + Duration::minutes(i as i64))
            .unwrap();
    }
    let got = p.query_range(t0(), t0() + Duration::minutes(1));
    let outlets: Vec<_> = got.iter().map(|e| e.outlet.as_str()).collect();
    assert_eq!(outlets, vec!["A NEWS", "B NEWS"]);
}

#[test]
fn report_counts_each_actor_once_per_entry() {
    let p = pipeline();
    p.ingest("🔴 SMITH, Mayor Smith / DAILY NEWS\nuno", t0()).unwrap();
    p.ingest("🟢 J. Smith y Jane Roe / DAILY NEWS\ndos", t0()).unwrap();

    let entries = p.query_range(t0(), t0());
    let report = p.build_report(&entries, "T");
    assert!(report.contains("John Smith\n| Total 2   🟢1 🟡0 🔴1 ⚠️0"));
    assert!(report.contains("Jane Roe\n| Total 1   🟢1 🟡0 🔴0 ⚠️0"));
}
