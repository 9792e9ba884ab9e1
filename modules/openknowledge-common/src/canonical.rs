//! URL canonicalization shared by every component that keys on urls.
//!
//! Links scraped out of free text (forum comments, markdown) routinely carry
//! punctuation from the surrounding sentence: `see https://x.org/guide).` or
//! `<https://x.org>`. Two urls that differ only by that debris are the same
//! resource.

/// Characters stripped from the end of a url unconditionally.
const TRAILING_JUNK: &[char] = &['.', ',', ';', ':', '!', '?', ']', '>', '"', '\'', '*'];

/// Characters stripped from the start of a url.
const LEADING_JUNK: &[char] = &['<', '(', '"', '\''];

/// Canonical form of a url used for equality and deduplication.
///
/// Trailing `)` is only removed while the url has more closing than opening
/// parens, so `https://en.wikipedia.org/wiki/Graph_(mathematics)` survives.
pub fn canonical_url(raw: &str) -> String {
    let mut s = raw.trim().trim_start_matches(LEADING_JUNK);

    loop {
        let before = s.len();
        s = s.trim_end_matches(TRAILING_JUNK);
        if s.ends_with(')') && s.matches(')').count() > s.matches('(').count() {
            s = &s[..s.len() - 1];
        }
        if s.len() == before {
            break;
        }
    }

    s.to_string()
}

/// Host and port a raw TCP reachability check should dial for `raw`.
///
/// An explicit port wins; otherwise 443 for https and 80 for everything else.
pub fn host_and_port(raw: &str) -> Option<(String, u16)> {
    let parsed = url::Url::parse(raw).ok()?;
    // IPv6 literals without their brackets so they dial as addresses
    let host = match parsed.host()? {
        url::Host::Ipv6(addr) => addr.to_string(),
        other => other.to_string(),
    };
    let port = parsed
        .port()
        .unwrap_or(if parsed.scheme() == "https" { 443 } else { 80 });
    Some((host, port))
}
