use std::collections::HashSet;

use fockey_core::domain::get_parent_domain;
use fockey_core::types::RuleKind;
use serde::Serialize;

use crate::parser::ParsedRule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    /// Domain rules already blocked by a broader domain rule
    pub covered: usize,
}

/// Drop duplicates and domain rules made redundant by a broader one.
///
/// `example.com` covers its subdomains, `*.example.com` and `example.com/path`.
/// `*.example.com` covers strict subdomains only. Order is preserved.
pub fn optimize_rules(rules: &mut Vec<ParsedRule>) -> OptimizeStats {
    let before = rules.len();

    let mut seen: HashSet<RuleKey> = HashSet::new();
    let mut deduped = 0usize;
    rules.retain(|rule| {
        if seen.insert(RuleKey::from(rule)) {
            true
        } else {
            deduped += 1;
            false
        }
    });

    let mut whole_hosts: HashSet<String> = HashSet::new();
    let mut wildcard_hosts: HashSet<String> = HashSet::new();
    for rule in rules.iter().filter(|r| r.kind == RuleKind::Domain) {
        match DomainShape::of(&rule.value) {
            DomainShape::Host(host) => whole_hosts.insert(host.to_string()),
            DomainShape::Wildcard(host) => wildcard_hosts.insert(host.to_string()),
            DomainShape::Path(_) => false,
        };
    }

    let mut covered = 0usize;
    rules.retain(|rule| {
        if rule.kind != RuleKind::Domain {
            return true;
        }
        let shape = DomainShape::of(&rule.value);
        let host = shape.host();
        let by_self = !matches!(shape, DomainShape::Host(_)) && whole_hosts.contains(host);
        let by_parent = parents(host).any(|p| whole_hosts.contains(p) || wildcard_hosts.contains(p));
        if by_self || by_parent {
            log::debug!("dropping {:?}: covered by a broader rule", rule.value);
            covered += 1;
            false
        } else {
            true
        }
    });

    OptimizeStats {
        before,
        after: rules.len(),
        deduped,
        covered,
    }
}

fn parents(host: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(get_parent_domain(host), |h| get_parent_domain(*h))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    kind: RuleKind,
    value: String,
}

impl From<&ParsedRule> for RuleKey {
    fn from(rule: &ParsedRule) -> Self {
        Self {
            kind: rule.kind,
            value: rule.value.to_lowercase(),
        }
    }
}

enum DomainShape<'a> {
    Host(&'a str),
    Wildcard(&'a str),
    Path(&'a str),
}

impl<'a> DomainShape<'a> {
    fn of(value: &'a str) -> Self {
        if let Some(host) = value.strip_prefix("*.") {
            return Self::Wildcard(host);
        }
        match value.find('/') {
            Some(pos) => Self::Path(&value[..pos]),
            None => Self::Host(value),
        }
    }

    fn host(&self) -> &'a str {
        match self {
            Self::Host(host) | Self::Wildcard(host) | Self::Path(host) => host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(kind: RuleKind, value: &str) -> ParsedRule {
        ParsedRule { kind, value: value.to_string(), line: 0 }
    }

    fn domains(values: &[&str]) -> Vec<ParsedRule> {
        values.iter().map(|v| rule(RuleKind::Domain, v)).collect()
    }

    fn remaining(rules: &[ParsedRule]) -> Vec<&str> {
        rules.iter().map(|r| r.value.as_str()).collect()
    }

    #[test]
    fn test_dedupe_is_case_insensitive_per_kind() {
        let mut rules = vec![
            rule(RuleKind::ContentKeyword, "Minecraft"),
            rule(RuleKind::ContentKeyword, "minecraft"),
            rule(RuleKind::UrlKeyword, "minecraft"),
        ];
        let stats = optimize_rules(&mut rules);
        assert_eq!(stats, OptimizeStats { before: 3, after: 2, deduped: 1, covered: 0 });
        assert_eq!(remaining(&rules), vec!["Minecraft", "minecraft"]);
    }

    #[test]
    fn test_parent_domain_covers_children() {
        let mut rules = domains(&[
            "m.youtube.com",
            "youtube.com",
            "youtube.com/shorts",
            "*.youtube.com",
            "notyoutube.com",
        ]);
        let stats = optimize_rules(&mut rules);
        assert_eq!(stats.covered, 3);
        assert_eq!(remaining(&rules), vec!["youtube.com", "notyoutube.com"]);
    }

    #[test]
    fn test_wildcard_covers_subdomains_only() {
        let mut rules = domains(&["*.example.com", "example.com/news", "a.b.example.com"]);
        let stats = optimize_rules(&mut rules);
        assert_eq!(stats.covered, 1);
        assert_eq!(remaining(&rules), vec!["*.example.com", "example.com/news"]);
    }

    #[test]
    fn test_empty() {
        let mut rules = Vec::new();
        assert_eq!(optimize_rules(&mut rules), OptimizeStats::default());
    }
}
