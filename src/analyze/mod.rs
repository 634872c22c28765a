// src/analyze/mod.rs
//! Topic extraction over a batch of entries.
//!
//! Tier 1: configured keyword co-occurrence rules (`rules`). When at least one
//! rule matches, its topics are the answer.
//! Tier 2: n-gram frequency mining (`ngrams`), used only when no rule matched.

pub mod ngrams;
pub mod rules;

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::config::Catalog;
use crate::entry::Entry;
use crate::text::{collapse_ws, fold, strip_urls};

pub use crate::analyze::rules::{RuleSet, TopicRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicTier {
    Rule,
    Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub label: String,
    /// Distinct entries supporting the topic.
    pub entries: usize,
    /// Distinct outlets of the supporting entries, sorted.
    pub outlets: Vec<String>,
    /// Illustrative sentence (frequency tier only).
    pub snippet: Option<String>,
    pub tier: TopicTier,
}

/// Tokenized view of one entry: actors + scope + body, URLs stripped and the
/// entry's own outlet name removed.
#[derive(Debug)]
pub(crate) struct Document<'a> {
    pub entry: &'a Entry,
    /// `(surface uppercase, folded)` per word.
    pub tokens: Vec<(String, String)>,
    /// Body only, one item per sentence. Phrases are mined here so they never
    /// span the actor, scope or sentence boundaries.
    pub sentences: Vec<Sentence>,
}

#[derive(Debug)]
pub(crate) struct Sentence {
    pub text: String,
    pub tokens: Vec<(String, String)>,
}

impl<'a> Document<'a> {
    pub fn new(entry: &'a Entry) -> Self {
        let mut parts: Vec<&str> = entry.actors.iter().map(|a| a.as_str()).collect();
        parts.push(&entry.scope);
        parts.push(&entry.body);
        let text = strip_urls(&parts.join(" "));

        let outlet: Option<Vec<String>> = entry
            .has_real_outlet()
            .then(|| tokenize(&entry.outlet).into_iter().map(|(_, f)| f).collect());

        let mut tokens = tokenize(&text);
        if let Some(outlet) = &outlet {
            remove_phrase(&mut tokens, outlet);
        }

        let sentences = body_sentences(&entry.body)
            .into_iter()
            .filter_map(|text| {
                let mut tokens = tokenize(&text);
                if let Some(outlet) = &outlet {
                    remove_phrase(&mut tokens, outlet);
                }
                (!tokens.is_empty()).then_some(Sentence { text, tokens })
            })
            .collect();

        Self {
            entry,
            tokens,
            sentences,
        }
    }

    /// Folded text with single-space word breaks, for rule matching.
    pub fn folded(&self) -> String {
        self.tokens
            .iter()
            .map(|(_, f)| f.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// URL-free body split at sentence punctuation and line breaks.
pub(crate) fn body_sentences(body: &str) -> Vec<String> {
    strip_urls(body)
        .split(['.', '!', '?', '\n'])
        .map(collapse_ws)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split on anything non-alphanumeric; uppercase surface plus folded form.
pub(crate) fn tokenize(text: &str) -> Vec<(String, String)> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| {
            let surface = t.to_uppercase();
            let folded = fold(&surface);
            (surface, folded)
        })
        .collect()
}

fn remove_phrase(tokens: &mut Vec<(String, String)>, phrase: &[String]) {
    if phrase.is_empty() {
        return;
    }
    let mut i = 0;
    while i + phrase.len() <= tokens.len() {
        let hit = tokens[i..i + phrase.len()]
            .iter()
            .zip(phrase)
            .all(|((_, f), p)| f == p);
        if hit {
            tokens.drain(i..i + phrase.len());
        } else {
            i += 1;
        }
    }
}

/// Sorted distinct outlets, ignoring the `NO OUTLET` sentinel.
pub(crate) fn outlets_of<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|e| e.has_real_outlet())
        .map(|e| e.outlet.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Two-tier topic extraction, at most `limit` topics.
pub fn extract_topics(entries: &[Entry], catalog: &Catalog, limit: usize) -> Vec<Topic> {
    if entries.is_empty() || limit == 0 {
        return Vec::new();
    }
    let docs: Vec<Document> = entries.iter().map(Document::new).collect();

    let by_rule = rule_topics(&docs, &catalog.topics, limit);
    if !by_rule.is_empty() {
        return by_rule;
    }
    ngrams::frequency_topics(&docs, catalog, limit)
}

fn rule_topics(docs: &[Document], rules: &RuleSet, limit: usize) -> Vec<Topic> {
    let folded: Vec<String> = docs.iter().map(Document::folded).collect();

    let mut topics: Vec<Topic> = Vec::new();
    for rule in &rules.rules {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hits: Vec<&Entry> = Vec::new();
        for (doc, text) in docs.iter().zip(&folded) {
            if rule.matches(text) && seen.insert(doc.entry.id.as_str()) {
                hits.push(doc.entry);
            }
        }
        if hits.is_empty() {
            continue;
        }
        topics.push(Topic {
            label: rule.label.clone(),
            entries: hits.len(),
            outlets: outlets_of(hits.iter().copied()),
            snippet: None,
            tier: TopicTier::Rule,
        });
    }

    topics.sort_by(|a, b| b.entries.cmp(&a.entries).then_with(|| a.label.cmp(&b.label)));
    topics.truncate(limit);
    topics
}
