use crate::error::SearchError;
use crate::models::Candidate;
use crate::pipeline::fanout::CancelToken;
use crate::pipeline::traits::{SearchHit, SearchProvider, SearchQuery};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use url::Url;

/// Runs one search for the claim and turns the hits into candidates.
///
/// Hits are dropped when their URL was already seen, when they come from the
/// same site as `origin_url`, or when they are malformed. A failed search is
/// returned as `Err` so the caller can log it and continue with no candidates.
pub async fn retrieve_candidates<S>(
    search: &S,
    query: &SearchQuery,
    origin_url: Option<&str>,
    cancel: &CancelToken,
) -> Result<Vec<Candidate>, SearchError>
where
    S: SearchProvider + ?Sized,
{
    tracing::info!(query = %query.text, "searching for sources");
    let hits = cancel
        .run_until_cancelled(search.search(query))
        .await
        .ok_or(SearchError::Cancelled)??;

    let origin_host = origin_url.and_then(origin_host);
    let candidates = filter_hits(hits, origin_host.as_deref());
    tracing::info!(count = candidates.len(), "retrieved candidates");
    Ok(candidates)
}

fn origin_host(raw: &str) -> Option<String> {
    match Url::parse(raw.trim()) {
        Ok(url) => url.host_str().map(normalize_host),
        Err(e) => {
            tracing::warn!(origin = raw, error = %e, "ignoring unparseable origin url");
            None
        }
    }
}

pub(crate) fn filter_hits(hits: Vec<SearchHit>, origin_host: Option<&str>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(hits.len());

    for hit in hits {
        let candidate = match to_candidate(hit) {
            Ok(c) => c,
            Err(reason) => {
                tracing::warn!(%reason, "skipping malformed result");
                continue;
            }
        };
        if !seen.insert(candidate.url.as_str().to_string()) {
            tracing::debug!(url = %candidate.url, "skipping duplicate result");
            continue;
        }
        if let (Some(origin), Some(host)) = (origin_host, candidate.url.host_str()) {
            if same_site(&normalize_host(host), origin) {
                tracing::debug!(url = %candidate.url, "skipping result from origin site");
                continue;
            }
        }
        candidates.push(candidate);
    }
    candidates
}

fn to_candidate(hit: SearchHit) -> Result<Candidate, String> {
    let url = Url::parse(hit.url.trim()).map_err(|e| format!("invalid url {:?}: {e}", hit.url))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(format!("unsupported url {:?}", hit.url));
    }
    let score = hit.score.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&score) {
        return Err(format!("score {score} out of range for {url}"));
    }
    let published_at = hit.published_date.as_deref().and_then(parse_published);

    Ok(Candidate {
        url,
        title: hit.title.unwrap_or_default(),
        content_snippet: hit.content.unwrap_or_default(),
        raw_content: hit.raw_content,
        score,
        published_at,
    })
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Hosts are the same site when equal or when one is a subdomain of the
/// other on a label boundary (`news.example.com` vs `example.com`, but not
/// `notexample.com`).
/// Either direction counts, so subdomains of the origin are excluded along
/// with the origin itself, which is wider than a one-way suffix check.
pub(crate) fn same_site(a: &str, b: &str) -> bool {
    a == b || is_subdomain_of(a, b) || is_subdomain_of(b, a)
}

fn is_subdomain_of(host: &str, parent: &str) -> bool {
    host.len() > parent.len()
        && host.ends_with(parent)
        && host.as_bytes()[host.len() - parent.len() - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::mock::{hit, StaticSearch};
    use crate::pipeline::traits::SearchDepth;

    fn query() -> SearchQuery {
        SearchQuery {
            text: "Tesla delivered approximately 1.81 million vehicles in 2023.".to_string(),
            max_results: 10,
            depth: SearchDepth::Advanced,
        }
    }

    #[tokio::test]
    async fn retrieves_sources_for_claim() {
        let search = StaticSearch::new(vec![hit(
            "https://example.com/article",
            "Test Article",
            "Test content about the claim.",
            0.85,
        )]);
        let candidates = retrieve_candidates(&search, &query(), None, &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Test Article");
        assert_eq!(search.queries(), vec![query().text]);
    }

    #[tokio::test]
    async fn provider_error_is_returned() {
        let search = StaticSearch::failing("Tavily Error");
        let err = retrieve_candidates(&search, &query(), None, &CancelToken::never())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Tavily Error"));
    }

    #[test]
    fn skips_malformed_results() {
        let mut bad_score = hit("https://example.com/score", "Score", "c", 0.5);
        bad_score.score = Some(1.7);
        let hits = vec![
            SearchHit {
                url: "not-a-valid-url".to_string(),
                title: Some("Bad".to_string()),
                ..Default::default()
            },
            hit("ftp://example.com/file", "Ftp", "c", 0.5),
            bad_score,
            hit("https://example.com/good", "Good Article", "Good content", 0.9),
        ];
        let candidates = filter_hits(hits, None);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].url.as_str().contains("good"));
    }

    #[test]
    fn missing_fields_get_defaults() {
        let hits = vec![SearchHit {
            url: "https://example.com/bare".to_string(),
            published_date: Some("sometime last week".to_string()),
            ..Default::default()
        }];
        let candidates = filter_hits(hits, None);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "");
        assert_eq!(candidates[0].score, 0.0);
        assert!(candidates[0].published_at.is_none());
    }

    #[test]
    fn parses_common_date_formats() {
        assert!(parse_published("2024-01-02T10:00:00Z").is_some());
        assert!(parse_published("Tue, 02 Jan 2024 10:00:00 GMT").is_some());
    }

    #[test]
    fn drops_exact_duplicate_urls() {
        let hits = vec![
            hit("https://a.example.org/x", "A", "c", 0.9),
            hit("https://a.example.org/x", "A again", "c", 0.8),
            hit("https://a.example.org/y", "B", "c", 0.7),
        ];
        let candidates = filter_hits(hits, None);
        let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn excludes_origin_site_on_label_boundary() {
        let hits = vec![
            hit("https://example.com/story", "Origin", "c", 0.9),
            hit("https://news.example.com/story", "Origin subdomain", "c", 0.9),
            hit("https://www.example.com/other", "Origin www", "c", 0.9),
            hit("https://notexample.com/story", "Unrelated", "c", 0.9),
        ];
        let candidates = filter_hits(hits, Some("example.com"));
        let titles: Vec<_> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Unrelated"]);
    }

    #[tokio::test]
    async fn origin_subdomain_excludes_parent_site() {
        let search = StaticSearch::new(vec![
            hit("https://example.com/story", "Parent", "c", 0.9),
            hit("https://reuters.com/story", "Other", "c", 0.9),
        ]);
        let candidates = retrieve_candidates(
            &search,
            &query(),
            Some("https://blog.example.com/post/1"),
            &CancelToken::never(),
        )
        .await
        .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Other");
    }

    #[tokio::test]
    async fn unparseable_origin_excludes_nothing() {
        let search = StaticSearch::new(vec![hit("https://example.com/a", "A", "c", 0.9)]);
        let candidates =
            retrieve_candidates(&search, &query(), Some("not a url"), &CancelToken::never())
                .await
                .unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn same_site_rules() {
        assert!(same_site("example.com", "example.com"));
        assert!(same_site("a.example.com", "example.com"));
        assert!(same_site("example.com", "a.example.com"));
        assert!(!same_site("notexample.com", "example.com"));
        assert!(!same_site("example.com.evil.net", "example.com"));
    }
}
