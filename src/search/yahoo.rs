//! Yahoo image search provider (secondary engine).
//!
//! Yahoo's result grid renders plain `<img>` elements, so CSS selectors do
//! the extraction. The result markup has shifted over time, so three
//! selector passes run in fallback order:
//!
//! 1. `img[class*="process"]` with a `src` attribute
//! 2. the same class with `data-src` (lazy-loaded variant)
//! 3. any `img[src]`, with icon and logo URLs filtered out

use super::{SearchError, SearchProvider, MAX_HITS_PER_ENGINE, SEARCH_TIMEOUT};
use crate::models::{Engine, ImageHit};
use crate::utils::random_user_agent;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::instrument;

/// Scraping client for Yahoo image search.
#[derive(Debug)]
pub struct YahooImages {
    http: reqwest::Client,
}

impl YahooImages {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?,
        })
    }
}

#[async_trait]
impl SearchProvider for YahooImages {
    fn engine(&self) -> Engine {
        Engine::Yahoo
    }

    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError> {
        let url = format!(
            "https://images.search.yahoo.com/search/images?p={}",
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

fn extract_hits(html: &str, query: &str) -> Vec<ImageHit> {
    let document = Html::parse_document(html);

    let process_src = Selector::parse(r#"img[class*="process"][src]"#).unwrap();
    let process_data_src = Selector::parse(r#"img[class*="process"][data-src]"#).unwrap();
    let any_img = Selector::parse("img[src]").unwrap();

    let mut urls: Vec<String> = document
        .select(&process_src)
        .filter_map(|e| e.value().attr("src"))
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        urls = document
            .select(&process_data_src)
            .filter_map(|e| e.value().attr("data-src"))
            .map(str::to_string)
            .collect();
    }

    if urls.is_empty() {
        urls = document
            .select(&any_img)
            .filter_map(|e| e.value().attr("src"))
            .filter(|url| {
                let lower = url.to_lowercase();
                !lower.contains("icon") && !lower.contains("logo")
            })
            .map(str::to_string)
            .collect();
    }

    urls.into_iter()
        .take(MAX_HITS_PER_ENGINE)
        .enumerate()
        .map(|(i, url)| ImageHit {
            url,
            title: format!("{} image {}", query, i + 1),
            source: Engine::Yahoo,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_selector() {
        let html = r#"
            <html><body>
              <img class="process-img loaded" src="https://img.example.com/a.jpg">
              <img class="site-logo" src="https://example.com/logo.png">
              <img class="process" src="https://img.example.com/b.jpg">
            </body></html>"#;
        let hits = extract_hits(html, "sunset");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://img.example.com/a.jpg");
        assert_eq!(hits[1].url, "https://img.example.com/b.jpg");
        assert!(hits.iter().all(|h| h.source == Engine::Yahoo));
    }

    #[test]
    fn test_data_src_fallback() {
        let html = r#"
            <html><body>
              <img class="process lazy" data-src="https://img.example.com/lazy.jpg">
            </body></html>"#;
        let hits = extract_hits(html, "sunset");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://img.example.com/lazy.jpg");
    }

    #[test]
    fn test_generic_fallback_filters_icons_and_logos() {
        let html = r#"
            <html><body>
              <img src="https://example.com/favicon-icon.png">
              <img src="https://example.com/brand-logo.png">
              <img src="https://img.example.com/photo.jpg">
            </body></html>"#;
        let hits = extract_hits(html, "sunset");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://img.example.com/photo.jpg");
    }

    #[test]
    fn test_empty_page_yields_no_hits() {
        assert!(extract_hits("<html><body></body></html>", "q").is_empty());
    }
}
