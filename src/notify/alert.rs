// src/notify/alert.rs
//! Immediate alert for a freshly stored negative/alert column.

use serde::Serialize;

use crate::entry::{ActorName, Entry, Severity};
use crate::text::truncate_chars;

pub const EXCERPT_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub severity: Severity,
    pub actors: Vec<ActorName>,
    /// Outlet, with ` (SCOPE)` appended when the column has one.
    pub outlet_line: String,
    pub excerpt: String,
    pub link: String,
}

impl AlertPayload {
    pub fn render(&self) -> String {
        let actors = self
            .actors
            .iter()
            .map(ActorName::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = format!("🚨 {} {} – {}", self.severity.icon(), actors, self.outlet_line);
        if !self.excerpt.is_empty() {
            out.push('\n');
            out.push_str(&self.excerpt);
        }
        if !self.link.is_empty() {
            out.push('\n');
            out.push_str(&self.link);
        }
        out
    }
}

/// `Some` only for high-severity entries.
pub fn alert_for(entry: &Entry) -> Option<AlertPayload> {
    if !entry.severity.is_high() {
        return None;
    }
    let outlet_line = if entry.has_scope() {
        format!("{} ({})", entry.outlet, entry.scope)
    } else {
        entry.outlet.clone()
    };
    Some(AlertPayload {
        severity: entry.severity,
        actors: entry.actors.clone(),
        outlet_line,
        excerpt: truncate_chars(&entry.body, EXCERPT_CHARS),
        link: entry.link.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(sev: Severity, scope: &str, body: &str) -> Entry {
        Entry {
            id: "https://example.com/a".into(),
            timestamp: Utc::now(),
            severity: sev,
            actors: vec![ActorName::new("John Smith"), ActorName::new("Jane Roe")],
            scope: scope.into(),
            outlet: "DAILY NEWS".into(),
            body: body.into(),
            link: "https://example.com/a".into(),
        }
    }

    #[test]
    fn low_severity_has_no_alert() {
        assert!(alert_for(&entry(Severity::Neutral, "", "x")).is_none());
        assert!(alert_for(&entry(Severity::Positive, "", "x")).is_none());
    }

    #[test]
    fn negative_alert_renders_header_body_and_link() {
        let a = alert_for(&entry(Severity::Negative, "STATE", "Body text.")).unwrap();
        assert_eq!(a.outlet_line, "DAILY NEWS (STATE)");
        assert_eq!(
            a.render(),
            "🚨 🔴 John Smith, Jane Roe – DAILY NEWS (STATE)\nBody text.\nhttps://example.com/a"
        );
    }

    #[test]
    fn excerpt_is_capped() {
        let long = "a".repeat(400);
        let a = alert_for(&entry(Severity::Alert, "", &long)).unwrap();
        assert_eq!(a.excerpt.chars().count(), EXCERPT_CHARS + 1);
        assert!(a.excerpt.ends_with('…'));
        assert_eq!(a.outlet_line, "DAILY NEWS");
    }
}
