//! Slice-based URL helpers used on the matching hot path.
//!
//! Nothing here allocates. A URL is split into its authority and the rest
//! by byte scanning; every accessor returns a slice of the input.

/// Bytes that end the authority part of a URL.
#[inline]
fn ends_authority(b: u8) -> bool {
    matches!(b, b'/' | b'?' | b'#')
}

/// Offset just past `scheme://`, or `None` if the URL has no such prefix.
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let colon = url.find(':')?;
    let scheme = &url.as_bytes()[..colon];
    let valid = scheme
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));

    (valid && url[colon..].starts_with("://")).then_some(colon + 3)
}

/// Authority slice (`user@host:port`) and the offset where it ends.
#[inline]
fn authority(url: &str) -> Option<(&str, usize)> {
    let start = get_scheme_end(url)?;
    let len = url.as_bytes()[start..]
        .iter()
        .position(|&b| ends_authority(b))
        .unwrap_or(url.len() - start);
    Some((&url[start..start + len], start + len))
}

/// Host of `url`, without userinfo or port.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (authority, _) = authority(url)?;
    let host = match authority.rfind('@') {
        Some(at) => &authority[at + 1..],
        None => authority,
    };
    let host = host.split(':').next().unwrap_or_default();
    (!host.is_empty()).then_some(host)
}

/// Drop one leading `www.` label, keeping at least one label.
#[inline]
pub fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") && host.len() > 4 => &host[4..],
        _ => host,
    }
}

/// Path of `url` without query or fragment; `/` when there is none.
#[inline]
pub fn extract_path(url: &str) -> &str {
    let rest = match authority(url) {
        Some((_, end)) => &url[end..],
        None => return "/",
    };
    if !rest.starts_with('/') {
        return "/";
    }
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_end() {
        assert_eq!(get_scheme_end("https://youtube.com"), Some(8));
        assert_eq!(get_scheme_end("chrome-extension://abc/popup.html"), Some(19));
        assert_eq!(get_scheme_end("youtube.com"), None);
        assert_eq!(get_scheme_end("about:blank"), None);
        assert_eq!(get_scheme_end("bad scheme://x"), None);
    }

    #[test]
    fn test_host() {
        assert_eq!(extract_host("https://reddit.com/r/rust"), Some("reddit.com"));
        assert_eq!(extract_host("https://reddit.com:8443/r"), Some("reddit.com"));
        assert_eq!(extract_host("https://me:pw@old.reddit.com/"), Some("old.reddit.com"));
        assert_eq!(extract_host("https://reddit.com?next=a@b"), Some("reddit.com"));
        assert_eq!(extract_host("https://reddit.com"), Some("reddit.com"));
        assert_eq!(extract_host("file:///tmp/a.html"), None);
    }

    #[test]
    fn test_www() {
        assert_eq!(strip_www("www.youtube.com"), "youtube.com");
        assert_eq!(strip_www("WWW.youtube.com"), "youtube.com");
        assert_eq!(strip_www("m.youtube.com"), "m.youtube.com");
        assert_eq!(strip_www("www."), "www.");
    }

    #[test]
    fn test_path() {
        assert_eq!(extract_path("https://youtube.com/shorts/abc"), "/shorts/abc");
        assert_eq!(extract_path("https://youtube.com/"), "/");
        assert_eq!(extract_path("https://youtube.com"), "/");
        assert_eq!(extract_path("https://youtube.com?v=1"), "/");
        assert_eq!(extract_path("https://youtube.com:8080/shorts/x?a=1#t"), "/shorts/x");
        assert_eq!(extract_path("not a url"), "/");
    }
}
