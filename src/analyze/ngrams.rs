// src/analyze/ngrams.rs
//! Frequency fallback: recurring 2- and 3-word phrases across entries.
//!
//! Phrases are mined sentence by sentence from entry bodies. Stopwords, role
//! words and actor-name tokens are removed first, so a topic is never just
//! somebody's name. A phrase counts once per entry and needs at least two
//! supporting entries. The sentence of its first occurrence is the snippet.

use std::collections::{HashMap, HashSet};

use super::{outlets_of, tokenize, Document, Topic, TopicTier};
use crate::config::Catalog;
use crate::entry::Entry;
use crate::text::{contains_words, truncate_chars};

pub const MIN_TOKEN_CHARS: usize = 3;
pub const MIN_SUPPORT: usize = 2;
pub const SNIPPET_CHARS: usize = 120;
const NGRAM_SIZES: [usize; 2] = [2, 3];

#[derive(Debug)]
struct Candidate {
    /// Folded words joined by single spaces.
    key: String,
    /// Lower-case surface form of the first occurrence.
    label: String,
    words: usize,
    /// Indices into the document slice, ascending and distinct.
    docs: Vec<usize>,
    /// Sentence holding the first occurrence.
    snippet: String,
}

pub(crate) fn frequency_topics(docs: &[Document], catalog: &Catalog, limit: usize) -> Vec<Topic> {
    let batch_actor_tokens: HashSet<String> = docs
        .iter()
        .flat_map(|d| d.entry.actors.iter())
        .flat_map(|a| tokenize(a.as_str()))
        .map(|(_, folded)| folded)
        .collect();

    let mut by_key: HashMap<String, Candidate> = HashMap::new();
    for (idx, doc) in docs.iter().enumerate() {
        let mut seen_here: HashSet<String> = HashSet::new();
        for sentence in &doc.sentences {
            let words: Vec<&(String, String)> = sentence
                .tokens
                .iter()
                .filter(|(_, f)| keep_token(f, catalog, &batch_actor_tokens))
                .collect();

            for n in NGRAM_SIZES {
                for window in words.windows(n) {
                    let key = window.iter().map(|(_, f)| f.as_str()).collect::<Vec<_>>().join(" ");
                    if !seen_here.insert(key.clone()) {
                        continue;
                    }
                    let cand = by_key.entry(key.clone()).or_insert_with(|| Candidate {
                        key,
                        label: window
                            .iter()
                            .map(|(s, _)| s.to_lowercase())
                            .collect::<Vec<_>>()
                            .join(" "),
                        words: n,
                        docs: Vec::new(),
                        snippet: truncate_chars(&sentence.text, SNIPPET_CHARS),
                    });
                    cand.docs.push(idx);
                }
            }
        }
    }

    let mut ranked: Vec<Candidate> = by_key
        .into_values()
        .filter(|c| distinct_entries(c, docs) >= MIN_SUPPORT)
        .collect();
    ranked.sort_by(|a, b| {
        distinct_entries(b, docs)
            .cmp(&distinct_entries(a, docs))
            .then_with(|| b.words.cmp(&a.words))
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut picked: Vec<Candidate> = Vec::new();
    for cand in ranked {
        if picked.len() >= limit {
            break;
        }
        let near_dup = picked
            .iter()
            .any(|p| contains_words(&p.key, &cand.key) || contains_words(&cand.key, &p.key));
        if !near_dup {
            picked.push(cand);
        }
    }

    picked
        .into_iter()
        .map(|c| {
            let entries: Vec<&Entry> = c.docs.iter().map(|&i| docs[i].entry).collect();
            Topic {
                entries: distinct_entries(&c, docs),
                outlets: outlets_of(entries.iter().copied()),
                snippet: Some(c.snippet),
                label: c.label,
                tier: TopicTier::Frequency,
            }
        })
        .collect()
}

fn keep_token(folded: &str, catalog: &Catalog, batch_actor_tokens: &HashSet<String>) -> bool {
    folded.chars().count() >= MIN_TOKEN_CHARS
        && !catalog.is_stopword(folded)
        && !catalog.is_role_word(folded)
        && !catalog.is_actor_token(folded)
        && !batch_actor_tokens.contains(folded)
}

/// Same entry may sit in the batch twice (e.g. a merged range); count ids.
fn distinct_entries(c: &Candidate, docs: &[Document]) -> usize {
    c.docs
        .iter()
        .map(|&i| docs[i].entry.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
