//! Domain rule normalization and host suffix walking
//!
//! # Examples
//!
//! ```
//! use fockey_core::domain::normalize_domain_rule;
//!
//! assert_eq!(normalize_domain_rule("https://www.YouTube.com/shorts/"), Some("youtube.com/shorts".to_string()));
//! assert_eq!(normalize_domain_rule("*.reddit.com"), Some("*.reddit.com".to_string()));
//! ```

use crate::url::{extract_host, extract_path, get_scheme_end, strip_www};

/// Canonical form of a user-entered domain rule.
///
/// Accepts bare hosts, full URLs, `*.host` wildcards and `host/path`
/// prefixes. The result is lower-cased, without scheme, port, query, fragment,
/// trailing slash or leading `www.`. Returns `None` if no valid host remains.
pub fn normalize_domain_rule(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (wildcard, rest) = match trimmed.strip_prefix("*.") {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    // Reuse the URL parser by giving bare entries a scheme.
    let owned;
    let as_url = if get_scheme_end(rest).is_some() {
        rest
    } else {
        owned = format!("http://{rest}");
        owned.as_str()
    };

    let host = normalize_host(extract_host(as_url)?)?;
    let path = extract_path(as_url).trim_end_matches('/').to_ascii_lowercase();

    let mut rule = String::with_capacity(host.len() + path.len() + 2);
    if wildcard {
        rule.push_str("*.");
    }
    rule.push_str(&host);
    rule.push_str(&path);
    Some(rule)
}

/// Lower-case a host, trim dots and a leading `www.`; `None` if it has invalid characters.
pub fn normalize_host(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_matches('.');
    let trimmed = strip_www(trimmed);
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
    {
        return None;
    }

    Some(trimmed.to_ascii_lowercase())
}

/// Host with its leftmost label removed; `None` for a single label.
pub fn get_parent_domain(host: &str) -> Option<&str> {
    let (_, parent) = host.split_once('.')?;
    (!parent.is_empty()).then_some(parent)
}

/// `a.b.com`, `b.com`, `com`: most specific first.
pub fn walk_host_suffixes(host: &str) -> impl Iterator<Item = &str> {
    let first = (!host.is_empty()).then_some(host);
    std::iter::successors(first, |h| get_parent_domain(*h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_rule() {
        assert_eq!(normalize_domain_rule("YouTube.com"), Some("youtube.com".to_string()));
        assert_eq!(normalize_domain_rule("  www.reddit.com/ "), Some("reddit.com".to_string()));
        assert_eq!(
            normalize_domain_rule("https://www.youtube.com/Shorts/?feature=x#top"),
            Some("youtube.com/shorts".to_string())
        );
        assert_eq!(normalize_domain_rule("example.com:8080"), Some("example.com".to_string()));
        assert_eq!(normalize_domain_rule("*.Example.com"), Some("*.example.com".to_string()));
    }

    #[test]
    fn test_normalize_domain_rule_rejects() {
        assert_eq!(normalize_domain_rule(""), None);
        assert_eq!(normalize_domain_rule("   "), None);
        assert_eq!(normalize_domain_rule("not a domain"), None);
        assert_eq!(normalize_domain_rule("/path/only"), None);
    }

    #[test]
    fn test_get_parent_domain() {
        assert_eq!(get_parent_domain("sub.example.com"), Some("example.com"));
        assert_eq!(get_parent_domain("example.com"), Some("com"));
        assert_eq!(get_parent_domain("com"), None);
        assert_eq!(get_parent_domain(""), None);
    }

    #[test]
    fn test_walk_host_suffixes() {
        let suffixes: Vec<&str> = walk_host_suffixes("a.b.example.com").collect();
        assert_eq!(suffixes, vec!["a.b.example.com", "b.example.com", "example.com", "com"]);
        assert_eq!(walk_host_suffixes("").count(), 0);
    }
}
