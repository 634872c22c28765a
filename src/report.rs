//! # Report Renderer
//! Pure formatting of an entry subset into the periodic digest text:
//! severity tally, actor ranking, outlets publishing and topics.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::analyze::{extract_topics, Topic, TopicTier};
use crate::config::Catalog;
use crate::entry::{ActorName, Entry, Severity};

pub const EMPTY_PERIOD_MESSAGE: &str = "No entries in this period.";

/// Per-severity counters for one bucket (whole report or one actor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub alert: usize,
    pub total: usize,
}

impl Tally {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Positive => self.positive += 1,
            Severity::Neutral => self.neutral += 1,
            Severity::Negative => self.negative += 1,
            Severity::Alert => self.alert += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Positive => self.positive,
            Severity::Neutral => self.neutral,
            Severity::Negative => self.negative,
            Severity::Alert => self.alert,
        }
    }

    pub fn of<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut t = Self::default();
        for e in entries {
            t.add(e.severity);
        }
        t
    }
}

/// Fixed-shape per-actor record.
pub type ActorTally = Tally;

/// Actors ranked by mentions (desc), then name (asc). An entry counts at most
/// once per actor.
pub fn rank_actors(entries: &[Entry]) -> Vec<(ActorName, ActorTally)> {
    let mut by_actor: HashMap<&ActorName, ActorTally> = HashMap::new();
    for e in entries {
        let mut seen: HashSet<&ActorName> = HashSet::new();
        for actor in &e.actors {
            if seen.insert(actor) {
                by_actor.entry(actor).or_default().add(e.severity);
            }
        }
    }

    let mut ranked: Vec<(ActorName, ActorTally)> = by_actor
        .into_iter()
        .map(|(a, t)| (a.clone(), t))
        .collect();
    ranked.sort_by(|(a, ta), (b, tb)| tb.total.cmp(&ta.total).then_with(|| a.cmp(b)));
    ranked
}

/// Distinct outlets, alphabetical. The `NO OUTLET` sentinel only shows up
/// when nothing else does.
pub fn outlet_list(entries: &[Entry]) -> Vec<String> {
    let all: BTreeSet<&str> = entries.iter().map(|e| e.outlet.as_str()).collect();
    let real: Vec<String> = entries
        .iter()
        .filter(|e| e.has_real_outlet())
        .map(|e| e.outlet.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    if real.is_empty() {
        all.into_iter().map(str::to_string).collect()
    } else {
        real
    }
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::Positive => "Positive",
        Severity::Neutral => "Neutral",
        Severity::Negative => "Negative",
        Severity::Alert => "Alerts",
    }
}

#[derive(Debug, Clone)]
pub struct ReportRenderer {
    catalog: Arc<Catalog>,
}

impl ReportRenderer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Render `entries` under `title`. No side effects.
    pub fn render(&self, entries: &[Entry], title: &str) -> String {
        if entries.is_empty() {
            return EMPTY_PERIOD_MESSAGE.to_string();
        }
        let cfg = self.catalog.report;
        let mut out = String::new();

        let _ = writeln!(out, "{title}");
        out.push('\n');

        // Severity tally
        let tally = Tally::of(entries);
        out.push_str("🚦 Severity\n");
        for s in Severity::ALL {
            let _ = writeln!(out, "{} {:<9} {}", s.icon(), format!("{}:", severity_label(s)), tally.get(s));
        }
        let _ = writeln!(out, "Total entries: {}", tally.total);
        out.push('\n');

        // Actors
        out.push_str("👥 Top actors\n");
        out.push_str("-------------------------\n");
        for (actor, t) in rank_actors(entries).into_iter().take(cfg.top_actors) {
            let _ = writeln!(out, "{actor}");
            let _ = writeln!(
                out,
                "| Total {}   🟢{} 🟡{} 🔴{} ⚠️{}",
                t.total, t.positive, t.neutral, t.negative, t.alert
            );
        }
        out.push('\n');

        // Outlets
        out.push_str("📰 Outlets publishing\n");
        for o in outlet_list(entries) {
            let _ = writeln!(out, "- {o}");
        }

        // Topics (omitted when none)
        let topics = extract_topics(entries, &self.catalog, cfg.max_topics);
        if !topics.is_empty() {
            out.push('\n');
            out.push_str("🧭 Topics\n");
            for topic in &topics {
                render_topic(&mut out, topic);
            }
        }

        out.trim_end().to_string()
    }
}

/// One-shot rendering without keeping a renderer around.
pub fn build_report(entries: &[Entry], title: &str, catalog: Arc<Catalog>) -> String {
    ReportRenderer::new(catalog).render(entries, title)
}

fn render_topic(out: &mut String, topic: &Topic) {
    let noun = if topic.entries == 1 { "entry" } else { "entries" };
    let _ = writeln!(out, "• {} ({} {noun})", topic.label, topic.entries);
    if !topic.outlets.is_empty() {
        let _ = writeln!(out, "  {}", topic.outlets.join(", "));
    }
    if topic.tier == TopicTier::Frequency {
        if let Some(snippet) = &topic.snippet {
            let _ = writeln!(out, "  “{snippet}”");
        }
    }
}
