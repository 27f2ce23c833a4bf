//! Core Matching Engine
//!
//! Every navigation and every content-script text probe goes through here.
//! Rules from all active sources (the Quick Block session and each active
//! schedule) are compiled once into lookup tables; matching a URL walks the
//! host suffixes and then scans the URL keywords.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::walk_host_suffixes;
use crate::types::{RuleKind, RuleSet};
use crate::url::{extract_host, extract_path, strip_www};

// =============================================================================
// Results
// =============================================================================

/// Where a matched rule came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RuleSource {
    QuickBlock,
    Schedule { id: String, name: String },
}

/// Final decision for a URL or text probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum MatchDecision {
    Allow,
    Block,
}

/// Result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub decision: MatchDecision,
    /// Kind of the rule that determined the decision
    pub kind: Option<RuleKind>,
    /// The rule as the user entered it (normalized)
    pub rule: Option<String>,
    pub source: Option<RuleSource>,
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            decision: MatchDecision::Allow,
            kind: None,
            rule: None,
            source: None,
        }
    }
}

impl MatchResult {
    pub fn is_blocked(&self) -> bool {
        self.decision == MatchDecision::Block
    }
}

// =============================================================================
// Compiled rules
// =============================================================================

#[derive(Debug, Clone)]
struct DomainEntry {
    rule: String,
    /// `*.host` form: the bare host itself does not match
    subdomains_only: bool,
    path: Option<String>,
    source: usize,
}

impl DomainEntry {
    fn matches(&self, is_exact_host: bool, path: &str) -> bool {
        if self.subdomains_only && is_exact_host {
            return false;
        }
        match &self.path {
            None => true,
            Some(prefix) => {
                path.starts_with(prefix.as_str())
                    && matches!(path.as_bytes().get(prefix.len()), None | Some(b'/'))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    needle: String,
    rule: String,
    source: usize,
}

/// The core matching engine.
#[derive(Debug, Clone, Default)]
pub struct BlockMatcher {
    sources: Vec<RuleSource>,
    domains: HashMap<String, Vec<DomainEntry>>,
    url_keywords: Vec<KeywordEntry>,
    content_keywords: Vec<KeywordEntry>,
}

impl BlockMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a rule set contributed by `source`.
    pub fn add_rules(&mut self, rules: &RuleSet, source: RuleSource) {
        let source_index = self.sources.len();
        self.sources.push(source);

        for (kind, value) in rules.iter() {
            match kind {
                RuleKind::Domain => self.add_domain(value, source_index),
                RuleKind::UrlKeyword => push_keyword(&mut self.url_keywords, value, source_index),
                RuleKind::ContentKeyword => {
                    push_keyword(&mut self.content_keywords, value, source_index)
                }
            }
        }
    }

    fn add_domain(&mut self, value: &str, source: usize) {
        let Some(normalized) = RuleKind::Domain.normalize(value) else {
            log::debug!("skipping unusable domain rule {value:?}");
            return;
        };

        let (subdomains_only, rest) = match normalized.strip_prefix("*.") {
            Some(rest) => (true, rest.to_string()),
            None => (false, normalized.clone()),
        };
        let (host, path) = match rest.find('/') {
            Some(pos) => (rest[..pos].to_string(), Some(rest[pos..].to_string())),
            None => (rest, None),
        };

        self.domains.entry(host).or_default().push(DomainEntry {
            rule: normalized,
            subdomains_only,
            path,
            source,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.url_keywords.is_empty() && self.content_keywords.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.domains.values().map(Vec::len).sum::<usize>()
            + self.url_keywords.len()
            + self.content_keywords.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Match a page URL against domain rules, then URL keywords.
    pub fn match_url(&self, url: &str) -> MatchResult {
        if let Some(result) = self.match_domains(url) {
            return result;
        }

        if !self.url_keywords.is_empty() {
            let haystack = url.to_lowercase();
            if let Some(entry) = self.url_keywords.iter().find(|e| haystack.contains(&e.needle)) {
                return self.block(RuleKind::UrlKeyword, &entry.rule, entry.source);
            }
        }

        MatchResult::default()
    }

    fn match_domains(&self, url: &str) -> Option<MatchResult> {
        if self.domains.is_empty() {
            return None;
        }

        let host = strip_www(extract_host(url)?).to_ascii_lowercase();
        let host = host.trim_end_matches('.');
        let path = extract_path(url).to_ascii_lowercase();

        for suffix in walk_host_suffixes(host) {
            let Some(entries) = self.domains.get(suffix) else {
                continue;
            };
            let is_exact_host = suffix.len() == host.len();
            if let Some(entry) = entries.iter().find(|e| e.matches(is_exact_host, &path)) {
                return Some(self.block(RuleKind::Domain, &entry.rule, entry.source));
            }
        }

        None
    }

    /// Match page text (video titles, channel names, descriptions).
    pub fn match_content(&self, text: &str) -> MatchResult {
        if self.content_keywords.is_empty() || text.is_empty() {
            return MatchResult::default();
        }

        let haystack = text.to_lowercase();
        match self.content_keywords.iter().find(|e| haystack.contains(&e.needle)) {
            Some(entry) => self.block(RuleKind::ContentKeyword, &entry.rule, entry.source),
            None => MatchResult::default(),
        }
    }

    pub fn should_block_url(&self, url: &str) -> bool {
        self.match_url(url).is_blocked()
    }

    fn block(&self, kind: RuleKind, rule: &str, source: usize) -> MatchResult {
        log::debug!("blocked by {kind} rule {rule:?}");
        MatchResult {
            decision: MatchDecision::Block,
            kind: Some(kind),
            rule: Some(rule.to_string()),
            source: self.sources.get(source).cloned(),
        }
    }
}

fn push_keyword(list: &mut Vec<KeywordEntry>, value: &str, source: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return;
    }
    list.push(KeywordEntry {
        needle: trimmed.to_lowercase(),
        rule: trimmed.to_string(),
        source,
    });
}
