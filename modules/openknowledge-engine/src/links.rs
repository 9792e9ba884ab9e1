use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use openknowledge_common::canonical_url;

/// Bare urls in free text. Square brackets end a match so markdown
/// `[label](url)` pairs split cleanly.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s\[\]]+").expect("valid regex"));

/// Canonical urls found in `text`, in order of appearance, without repeats.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_RE
        .find_iter(text)
        .map(|m| canonical_url(m.as_str()))
        .filter(|url| has_host_part(url) && seen.insert(url.clone()))
        .collect()
}

fn has_host_part(url: &str) -> bool {
    url.split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty())
}

/// Urls across several texts, first appearance wins.
pub fn extract_urls_from<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    texts
        .into_iter()
        .flat_map(extract_urls)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_urls_lose_trailing_punctuation() {
        let text = "Start with https://a.org/book. Then try (https://b.org/course), really!";
        assert_eq!(extract_urls(text), vec!["https://a.org/book", "https://b.org/course"]);
    }

    #[test]
    fn markdown_links_yield_one_url() {
        let text = "[https://a.org/x](https://a.org/x) and [notes](http://b.org/n)";
        assert_eq!(extract_urls(text), vec!["https://a.org/x", "http://b.org/n"]);
    }

    #[test]
    fn balanced_parens_survive() {
        let text = "see https://en.wikipedia.org/wiki/Graph_(mathematics)";
        assert_eq!(
            extract_urls(text),
            vec!["https://en.wikipedia.org/wiki/Graph_(mathematics)"]
        );
    }

    #[test]
    fn no_urls_and_bare_schemes() {
        assert!(extract_urls("nothing to see").is_empty());
        assert!(extract_urls("https:// broken").is_empty());
    }

    #[test]
    fn order_follows_text_order_across_comments() {
        let comments = ["top: https://b.org", "next: https://a.org https://b.org."];
        assert_eq!(
            extract_urls_from(comments),
            vec!["https://b.org", "https://a.org"]
        );
    }
}
