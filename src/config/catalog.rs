// src/config/catalog.rs
//! Static catalog: severity markers, scopes, roles, stopwords, actor and outlet
//! aliases, topic rules and report limits.
//!
//! Loaded once at startup from TOML (`COLUMNS_CONFIG_PATH` or
//! `config/columns.toml`) and shared read-only afterwards. Every lookup key is
//! stored in folded form (see [`crate::text::fold`]).

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::rules::{RuleSet, TopicRuleCfg};
use crate::text::{fold, fold_words};

pub const DEFAULT_CATALOG_PATH: &str = "config/columns.toml";
pub const ENV_CATALOG_PATH: &str = "COLUMNS_CONFIG_PATH";

/// Catalog shipped with the crate; also the fallback used by tests.
const EMBEDDED_CATALOG: &str = include_str!("../../config/columns.toml");

pub const DEFAULT_TOP_ACTORS: usize = 10;
pub const MIN_TOP_ACTORS: usize = 6;
pub const MAX_TOP_ACTORS: usize = 12;
pub const DEFAULT_MAX_TOPICS: usize = 5;

/* ----------------------------
File schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    severity: MarkerCfg,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    stopwords: Vec<String>,
    /// canonical display name -> surface variants
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
    /// canonical outlet name -> surface variants
    #[serde(default)]
    outlets: BTreeMap<String, Vec<String>>,
    /// host fragment -> outlet name
    #[serde(default)]
    outlet_hosts: BTreeMap<String, String>,
    #[serde(default)]
    topics: Vec<TopicRuleCfg>,
    #[serde(default)]
    report: ReportCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerCfg {
    #[serde(default = "default_positive")]
    pub positive: Vec<String>,
    #[serde(default = "default_neutral")]
    pub neutral: Vec<String>,
    #[serde(default = "default_negative")]
    pub negative: Vec<String>,
    #[serde(default = "default_alert")]
    pub alert: Vec<String>,
}

impl Default for MarkerCfg {
    fn default() -> Self {
        Self {
            positive: default_positive(),
            neutral: default_neutral(),
            negative: default_negative(),
            alert: default_alert(),
        }
    }
}

fn default_positive() -> Vec<String> {
    vec!["🟢".into()]
}
fn default_neutral() -> Vec<String> {
    vec!["🟡".into()]
}
fn default_negative() -> Vec<String> {
    vec!["🔴".into()]
}
fn default_alert() -> Vec<String> {
    vec!["⚠".into(), "🚨".into()]
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReportCfg {
    #[serde(default = "default_top_actors")]
    pub top_actors: usize,
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
}

impl Default for ReportCfg {
    fn default() -> Self {
        Self {
            top_actors: DEFAULT_TOP_ACTORS,
            max_topics: DEFAULT_MAX_TOPICS,
        }
    }
}

fn default_top_actors() -> usize {
    DEFAULT_TOP_ACTORS
}
fn default_max_topics() -> usize {
    DEFAULT_MAX_TOPICS
}

/* ----------------------------
Compiled catalog
---------------------------- */

#[derive(Debug, Clone)]
pub struct Catalog {
    pub markers: MarkerCfg,
    scopes: HashSet<String>,
    /// Role phrases as folded word lists, longest first.
    roles: Vec<Vec<String>>,
    role_words: HashSet<String>,
    stopwords: HashSet<String>,
    aliases: HashMap<String, String>,
    actor_tokens: HashSet<String>,
    outlets: HashMap<String, String>,
    outlet_hosts: Vec<(String, String)>,
    pub topics: RuleSet,
    pub report: ReportCfg,
}

impl Catalog {
    /// Load from `$COLUMNS_CONFIG_PATH`, falling back to `config/columns.toml`.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_CATALOG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading column catalog from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing column catalog {}", path.display()))
    }

    /// Catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_CATALOG).context("parsing embedded column catalog")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(s)?;
        Self::compile(file)
    }

    fn compile(file: CatalogFile) -> Result<Self> {
        if file.aliases.is_empty() {
            bail!("catalog has no [aliases] table");
        }

        let mut aliases = HashMap::new();
        let mut actor_tokens = HashSet::new();
        for (canonical, variants) in &file.aliases {
            let canonical = canonical.trim();
            if canonical.is_empty() {
                return Err(anyhow!("alias table contains an empty canonical name"));
            }
            for surface in std::iter::once(canonical).chain(variants.iter().map(String::as_str)) {
                let key = fold(surface);
                if key.is_empty() {
                    continue;
                }
                actor_tokens.extend(fold_words(surface).split(' ').map(str::to_string));
                aliases.insert(key, canonical.to_string());
            }
        }

        let mut outlets = HashMap::new();
        for (canonical, variants) in &file.outlets {
            let canonical = canonical.trim();
            for surface in std::iter::once(canonical).chain(variants.iter().map(String::as_str)) {
                let key = fold(surface);
                if !key.is_empty() {
                    outlets.insert(key, canonical.to_string());
                }
            }
        }

        let mut roles: Vec<Vec<String>> = file
            .roles
            .iter()
            .map(|r| fold(r))
            .filter(|r| !r.is_empty())
            .map(|r| r.split(' ').map(str::to_string).collect())
            .collect();
        roles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        roles.dedup();
        let role_words = roles.iter().flatten().cloned().collect();

        let topics = RuleSet::compile(&file.topics)?;

        let mut report = file.report;
        report.top_actors = report.top_actors.clamp(MIN_TOP_ACTORS, MAX_TOP_ACTORS);

        Ok(Self {
            markers: file.severity,
            scopes: fold_set(&file.scopes),
            roles,
            role_words,
            stopwords: fold_set(&file.stopwords),
            aliases,
            actor_tokens,
            outlets,
            outlet_hosts: file
                .outlet_hosts
                .into_iter()
                .map(|(host, name)| (host.trim().to_ascii_lowercase(), name))
                .filter(|(host, _)| !host.is_empty())
                .collect(),
            topics,
            report,
        })
    }

    pub fn is_scope(&self, token: &str) -> bool {
        self.scopes.contains(&fold(token))
    }

    /// Role phrases (folded words), longest first.
    pub fn roles(&self) -> &[Vec<String>] {
        &self.roles
    }

    pub fn is_role_word(&self, folded: &str) -> bool {
        self.role_words.contains(folded)
    }

    pub fn is_stopword(&self, folded: &str) -> bool {
        self.stopwords.contains(folded)
    }

    /// Folded token of any known actor name or alias variant.
    pub fn is_actor_token(&self, folded: &str) -> bool {
        self.actor_tokens.contains(folded)
    }

    pub fn alias(&self, folded: &str) -> Option<&str> {
        self.aliases.get(folded).map(String::as_str)
    }

    pub fn outlet_alias(&self, folded: &str) -> Option<&str> {
        self.outlets.get(folded).map(String::as_str)
    }

    /// First configured host fragment contained in `host` (lower-case).
    pub fn outlet_for_host(&self, host: &str) -> Option<&str> {
        self.outlet_hosts
            .iter()
            .find(|(frag, _)| host.contains(frag.as_str()))
            .map(|(_, name)| name.as_str())
    }
}

fn fold_set(items: &[String]) -> HashSet<String> {
    items
        .iter()
        .map(|s| fold(s))
        .filter(|s| !s.is_empty())
        .collect()
}
