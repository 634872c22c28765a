// src/ingest/severity.rs
//! Severity classification from icon markers: worst case wins.

use crate::config::catalog::MarkerCfg;
use crate::entry::Severity;

/// Highest-priority severity whose marker appears anywhere in `text`
/// (header or body). Defaults to `Neutral` when no marker is present.
pub fn classify(text: &str, markers: &MarkerCfg) -> Severity {
    let by_priority: [(Severity, &[String]); 4] = [
        (Severity::Alert, markers.alert.as_slice()),
        (Severity::Negative, markers.negative.as_slice()),
        (Severity::Neutral, markers.neutral.as_slice()),
        (Severity::Positive, markers.positive.as_slice()),
    ];

    by_priority
        .into_iter()
        .find(|(_, set)| set.iter().any(|m| !m.is_empty() && text.contains(m.as_str())))
        .map(|(sev, _)| sev)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m() -> MarkerCfg {
        MarkerCfg::default()
    }

    #[test]
    fn no_marker_defaults_to_neutral() {
        assert_eq!(classify("plain text", &m()), Severity::Neutral);
        assert_eq!(classify("", &m()), Severity::Neutral);
    }

    #[test]
    fn single_markers() {
        assert_eq!(classify("🟢 A / B", &m()), Severity::Positive);
        assert_eq!(classify("🟡 A / B", &m()), Severity::Neutral);
        assert_eq!(classify("🔴 A / B", &m()), Severity::Negative);
        assert_eq!(classify("⚠️ A / B", &m()), Severity::Alert);
        assert_eq!(classify("⚠ A / B", &m()), Severity::Alert);
    }

    #[test]
    fn worst_case_wins_across_header_and_body() {
        assert_eq!(classify("🟢 A / B\nbody 🔴", &m()), Severity::Negative);
        assert_eq!(classify("🔴 A / B\n🟢🟢🟢 ⚠️", &m()), Severity::Alert);
        assert_eq!(classify("🟢 A / B\n🟡", &m()), Severity::Neutral);
    }
}
