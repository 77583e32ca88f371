//! Bing image search provider (primary engine).
//!
//! Bing's result page embeds the full-size image URL of every thumbnail in
//! an HTML-escaped JSON attribute, `murl&quot;:&quot;…&quot;`. A regex over
//! the raw page is the most stable way to pull those out; if Bing changes
//! the markup the regex simply stops matching and the provider degrades to
//! zero results.

use super::{SearchError, SearchProvider, MAX_HITS_PER_ENGINE, SEARCH_TIMEOUT};
use crate::models::{Engine, ImageHit};
use crate::utils::random_user_agent;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use tracing::instrument;

static MURL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"murl&quot;:&quot;(.*?)&quot;").unwrap());

/// Scraping client for Bing image search.
#[derive(Debug)]
pub struct BingImages {
    http: reqwest::Client,
}

impl BingImages {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?,
        })
    }
}

#[async_trait]
impl SearchProvider for BingImages {
    fn engine(&self) -> Engine {
        Engine::Bing
    }

    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError> {
        let url = format!(
            "https://www.bing.com/images/search?q={}&first=1",
            urlencoding::encode(query)
        );
        let html = self
            .http
            .get(&url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        if html.is_empty() {
            return Err(SearchError::EmptyBody);
        }
        Ok(extract_hits(&html, query))
    }
}

/// Pull image URLs out of a Bing result page.
fn extract_hits(html: &str, query: &str) -> Vec<ImageHit> {
    MURL_RE
        .captures_iter(html)
        .take(MAX_HITS_PER_ENGINE)
        .enumerate()
        .map(|(i, cap)| ImageHit {
            url: cap[1].to_string(),
            title: format!("{} image {}", query, i + 1),
            source: Engine::Bing,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = concat!(
        r#"<html><body><a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example.com/cat1.jpg&quot;,"#,
        r#"&quot;turl&quot;:&quot;https://tse.example.com/t1&quot;}"></a>"#,
        r#"<a class="iusc" m="{&quot;murl&quot;:&quot;https://img.example.com/cat2.png&quot;}"></a>"#,
        r#"</body></html>"#
    );

    #[test]
    fn test_extract_hits_from_fixture() {
        let hits = extract_hits(FIXTURE, "cats playing");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://img.example.com/cat1.jpg");
        assert_eq!(hits[0].title, "cats playing image 1");
        assert_eq!(hits[1].url, "https://img.example.com/cat2.png");
        assert!(hits.iter().all(|h| h.source == Engine::Bing));
    }

    #[test]
    fn test_extract_hits_caps_at_five() {
        let mut html = String::new();
        for i in 0..8 {
            html.push_str(&format!(
                "murl&quot;:&quot;https://img.example.com/{i}.jpg&quot;"
            ));
        }
        assert_eq!(extract_hits(&html, "q").len(), MAX_HITS_PER_ENGINE);
    }

    #[test]
    fn test_markup_change_yields_no_hits() {
        let html = r#"<html><body><img src="https://img.example.com/x.jpg"></body></html>"#;
        assert!(extract_hits(html, "q").is_empty());
    }
}
