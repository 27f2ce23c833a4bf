use std::net::IpAddr;

use fockey_core::types::RuleKind;
use serde::Serialize;

/// One importable rule with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRule {
    pub kind: RuleKind,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("exception rules are not supported")]
    Exception,
    #[error("cosmetic filters are not supported")]
    Cosmetic,
    #[error("invalid domain")]
    InvalidDomain,
    #[error("empty keyword")]
    EmptyKeyword,
    #[error("unrecognized line")]
    Unrecognized,
}

/// A line that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejected {
    pub line: usize,
    pub text: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: ParseError,
}

fn serialize_reason<S: serde::Serializer>(reason: &ParseError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedList {
    pub rules: Vec<ParsedRule>,
    pub rejected: Vec<Rejected>,
}

/// Hostnames hosts files map to loopback for the machine itself.
const LOCAL_HOSTS: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "local",
    "broadcasthost",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
    "ip6-mcastprefix",
    "ip6-allnodes",
    "ip6-allrouters",
    "ip6-allhosts",
    "0.0.0.0",
];

pub fn parse_rule_list(text: &str) -> ParsedList {
    let mut list = ParsedList::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }

        match parse_line(line) {
            Ok(Some((kind, value))) => list.rules.push(ParsedRule { kind, value, line: line_no }),
            Ok(None) => {}
            Err(reason) => {
                log::debug!("line {line_no} rejected: {reason}");
                list.rejected.push(Rejected {
                    line: line_no,
                    text: line.to_string(),
                    reason,
                });
            }
        }
    }

    list
}

fn parse_line(line: &str) -> Result<Option<(RuleKind, String)>, ParseError> {
    if let Some((kind, rest)) = parse_kind_prefix(line) {
        return kind
            .normalize(rest)
            .map(|value| Some((kind, value)))
            .ok_or(match kind {
                RuleKind::Domain => ParseError::InvalidDomain,
                _ => ParseError::EmptyKeyword,
            });
    }

    if line.starts_with("@@") {
        return Err(ParseError::Exception);
    }
    if line.contains("##") || line.contains("#@#") || line.contains("#?#") {
        return Err(ParseError::Cosmetic);
    }

    let line = strip_inline_comment(line);

    if line.starts_with("||") {
        return parse_host_anchor_rule(line)
            .map(|domain| Some((RuleKind::Domain, domain)))
            .ok_or(ParseError::InvalidDomain);
    }

    if let Some(host) = parse_hosts_file_domain(line) {
        if LOCAL_HOSTS.contains(&host.as_str()) {
            return Ok(None);
        }
        return RuleKind::Domain
            .normalize(&host)
            .map(|domain| Some((RuleKind::Domain, domain)))
            .ok_or(ParseError::InvalidDomain);
    }

    if line.split_whitespace().nth(1).is_some() {
        return Err(ParseError::Unrecognized);
    }

    RuleKind::Domain
        .normalize(line)
        .map(|domain| Some((RuleKind::Domain, domain)))
        .ok_or(ParseError::InvalidDomain)
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with('#')
}

/// `url:`, `content:` and `domain:` prefixes select the rule kind explicitly.
fn parse_kind_prefix(line: &str) -> Option<(RuleKind, &str)> {
    let (prefix, rest) = line.split_once(':')?;
    // `http://...` is a URL, not a prefix
    if rest.starts_with("//") {
        return None;
    }
    let kind = match prefix.trim().to_ascii_lowercase().as_str() {
        "url" => RuleKind::UrlKeyword,
        "content" | "keyword" => RuleKind::ContentKeyword,
        "domain" => RuleKind::Domain,
        _ => return None,
    };
    Some((kind, rest))
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find(" #") {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    }
}

fn parse_host_anchor_rule(line: &str) -> Option<String> {
    let mut rest = line.trim().strip_prefix("||")?;
    if let Some(pos) = rest.find('$') {
        rest = &rest[..pos];
    }
    rest = rest.strip_prefix('.').unwrap_or(rest);

    let end = rest.find(|c: char| c == '^' || c == '|').unwrap_or(rest.len());
    let pattern = &rest[..end];
    if pattern.contains('*') {
        return None;
    }
    RuleKind::Domain.normalize(pattern)
}

fn parse_hosts_file_domain(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    let second = parts.next()?;

    if first.parse::<IpAddr>().is_ok() {
        return Some(second.to_ascii_lowercase());
    }

    None
}
