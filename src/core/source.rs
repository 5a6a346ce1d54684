//! URL-unique sources surfaced as citation candidates.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A deduplicated search result shown to the user as a citation candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Result title.
    pub title: String,
    /// Result URL; the dedup key.
    pub url: String,
    /// Search snippet.
    pub snippet: String,
    /// Publication date, when the search backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Favicon URL, derived from the host when the backend supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl Source {
    /// Derives a favicon URL from the result URL's host.
    #[must_use]
    pub fn derive_favicon(url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        Some(format!(
            "https://www.google.com/s2/favicons?sz=128&domain={host}"
        ))
    }
}

/// Deduplicates sources by exact URL match.
///
/// First-seen order and first-seen metadata win: a URL returned by two
/// different queries keeps the title/snippet/date of its first appearance
/// in the reassembled (query-ordered) list.
#[must_use]
pub fn collect_sources<I>(results: I) -> Vec<Source>
where
    I: IntoIterator<Item = Source>,
{
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|source| seen.insert(source.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn source(title: &str, url: &str) -> Source {
        Source {
            title: title.to_string(),
            url: url.to_string(),
            snippet: String::new(),
            date: None,
            favicon: None,
        }
    }

    #[test]
    fn test_dedup_keeps_first_seen_metadata() {
        let sources = vec![
            source("first", "https://a.example/page"),
            source("other", "https://b.example/page"),
            source("second", "https://a.example/page"),
        ];
        let collected = collect_sources(sources);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].title, "first");
        assert_eq!(collected[0].url, "https://a.example/page");
        assert_eq!(collected[1].url, "https://b.example/page");
    }

    #[test]
    fn test_dedup_preserves_order() {
        let sources = vec![
            source("c", "https://c.example"),
            source("a", "https://a.example"),
            source("b", "https://b.example"),
        ];
        let collected = collect_sources(sources);
        let urls: Vec<&str> = collected.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://c.example", "https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(collect_sources(Vec::new()).is_empty());
    }

    #[test]
    fn test_derive_favicon() {
        let favicon = Source::derive_favicon("https://www.typescriptlang.org/docs/");
        assert_eq!(
            favicon.as_deref(),
            Some("https://www.google.com/s2/favicons?sz=128&domain=www.typescriptlang.org")
        );
    }

    #[test]
    fn test_derive_favicon_invalid_url() {
        assert!(Source::derive_favicon("not a url").is_none());
    }

    proptest! {
        #[test]
        fn prop_collect_is_idempotent_and_url_unique(indices in proptest::collection::vec(0usize..6, 0..40)) {
            let sources: Vec<Source> = indices
                .iter()
                .enumerate()
                .map(|(i, idx)| source(&format!("title-{i}"), &format!("https://example.com/{idx}")))
                .collect();

            let mut expected_first: HashMap<String, String> = HashMap::new();
            for s in &sources {
                expected_first.entry(s.url.clone()).or_insert_with(|| s.title.clone());
            }

            let once = collect_sources(sources);
            prop_assert_eq!(once.len(), expected_first.len());
            for s in &once {
                prop_assert_eq!(Some(&s.title), expected_first.get(&s.url));
            }

            let twice = collect_sources(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
