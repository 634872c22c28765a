// src/entry.rs
//! Entry model: one parsed column, immutable after ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OTHERS_OF_INTEREST: &str = "OTHERS OF INTEREST";
pub const NO_OUTLET: &str = "NO OUTLET";

/// Tone/urgency of a column. Ordering follows report priority:
/// `Alert` > `Negative` > `Neutral` > `Positive`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Positive,
    #[default]
    Neutral,
    Negative,
    Alert,
}

impl Severity {
    /// Display order in reports.
    pub const ALL: [Severity; 4] = [
        Severity::Positive,
        Severity::Neutral,
        Severity::Negative,
        Severity::Alert,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Positive => "🟢",
            Severity::Neutral => "🟡",
            Severity::Negative => "🔴",
            Severity::Alert => "⚠️",
        }
    }

    /// Negative and alert columns trigger an immediate alert.
    pub fn is_high(self) -> bool {
        matches!(self, Severity::Negative | Severity::Alert)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Positive => "positive",
            Severity::Neutral => "neutral",
            Severity::Negative => "negative",
            Severity::Alert => "alert",
        };
        f.write_str(s)
    }
}

/// Canonical actor identity (display name after alias resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorName(String);

impl ActorName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn others() -> Self {
        Self(OTHERS_OF_INTEREST.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Dedup key: trailing link, or a content digest when there is none.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Unique, insertion-ordered, never empty.
    pub actors: Vec<ActorName>,
    /// Empty when the header carried no scope.
    pub scope: String,
    pub outlet: String,
    pub body: String,
    /// Empty when the post carried no link.
    pub link: String,
}

impl Entry {
    pub fn has_scope(&self) -> bool {
        !self.scope.is_empty()
    }

    pub fn has_real_outlet(&self) -> bool {
        self.outlet != NO_OUTLET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_priority() {
        assert!(Severity::Alert > Severity::Negative);
        assert!(Severity::Negative > Severity::Neutral);
        assert!(Severity::Neutral > Severity::Positive);
        assert_eq!(Severity::default(), Severity::Neutral);
    }

    #[test]
    fn high_severity() {
        assert!(Severity::Alert.is_high());
        assert!(Severity::Negative.is_high());
        assert!(!Severity::Neutral.is_high());
        assert!(!Severity::Positive.is_high());
    }

    #[test]
    fn severity_serializes_lowercase() {
        let s = serde_json::to_string(&Severity::Alert).unwrap();
        assert_eq!(s, "\"alert\"");
    }
}
