//! Topic rules engine (tier 1 of topic extraction).
//!
//! Minimal TOML DSL, evaluated on folded text (uppercase, accent-free,
//! punctuation as word breaks):
//! - `triggers`:   every group needs at least one member present
//! - `supporting`: same semantics, optional
//! - `exclude`:    the rule is dropped when ANY member is present
//!
//! ```toml
//! [[topics]]
//! label = "Water supply"
//! triggers = [["AGUA", "ACUEDUCTO"], ["ESCASEZ", "SEQUIA", "TANDEO"]]
//! exclude = ["AGUAS FRESCAS"]
//! ```

use serde::Deserialize;

use crate::text::{contains_words, fold_words};

/// Rule as written in the catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicRuleCfg {
    pub label: String,
    pub triggers: Vec<Vec<String>>,
    #[serde(default)]
    pub supporting: Vec<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Compiled rule: every keyword already folded.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicRule {
    pub label: String,
    triggers: Vec<Vec<String>>,
    supporting: Vec<Vec<String>>,
    exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<TopicRule>,
}

impl RuleSet {
    /// Fold keywords and drop empty groups. A rule without any usable trigger
    /// group can never match and is rejected.
    pub fn compile(cfgs: &[TopicRuleCfg]) -> anyhow::Result<Self> {
        let mut rules = Vec::with_capacity(cfgs.len());
        for cfg in cfgs {
            let triggers = fold_groups(&cfg.triggers);
            if triggers.is_empty() {
                anyhow::bail!("topic rule `{}` has no trigger keywords", cfg.label);
            }
            rules.push(TopicRule {
                label: cfg.label.trim().to_string(),
                triggers,
                supporting: fold_groups(&cfg.supporting),
                exclude: fold_list(&cfg.exclude),
            });
        }
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TopicRule {
    /// `doc` must already be in [`fold_words`] form.
    pub fn matches(&self, doc: &str) -> bool {
        if self.exclude.iter().any(|k| contains_words(doc, k)) {
            return false;
        }
        all_groups_hit(doc, &self.triggers) && all_groups_hit(doc, &self.supporting)
    }
}

// --- internals ---

fn all_groups_hit(doc: &str, groups: &[Vec<String>]) -> bool {
    groups
        .iter()
        .all(|group| group.iter().any(|k| contains_words(doc, k)))
}

fn fold_groups(groups: &[Vec<String>]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|g| fold_list(g))
        .filter(|g| !g.is_empty())
        .collect()
}

fn fold_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|k| fold_words(k))
        .filter(|k| !k.is_empty())
        .collect()
}
