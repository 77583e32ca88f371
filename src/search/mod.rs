//! Multi-engine image search with graceful degradation.
//!
//! Two scraping providers back the image pipeline, each behind the
//! [`SearchProvider`] trait so it can be swapped or faked in tests:
//!
//! | Engine | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Bing | [`bing`] | Regex over result markup | Primary engine |
//! | Yahoo | [`yahoo`] | CSS selectors | Secondary engine |
//!
//! Scraping third-party result pages is brittle by nature: a markup change
//! must degrade to zero results, never to an error reaching the article
//! pipeline. Each provider therefore suppresses and logs its own failures,
//! and [`search_images`] only ever returns a (possibly empty) list.

use crate::models::{Engine, ImageHit};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub mod bing;
pub mod yahoo;

pub use bing::BingImages;
pub use yahoo::YahooImages;

/// Budget for a single search or download request.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum hits a single engine contributes per query.
pub const MAX_HITS_PER_ENGINE: usize = 5;

/// A single engine call failing. Never propagates past [`search_images`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search returned an empty body")]
    EmptyBody,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// One image search engine.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Which engine this provider scrapes.
    fn engine(&self) -> Engine;

    /// Run one query against the engine. May fail; the cascade logs and
    /// treats failures as empty result sets.
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, SearchError>;
}

/// Query the provider list with the fallback cascade:
///
/// 1. Primary engine alone; if it yields at least 3 hits, done.
/// 2. Append the secondary engine's hits.
/// 3. If still fewer than 2 hits, retry each engine in turn with the query
///    cut down to its first 3 words and append those results.
#[instrument(level = "debug", skip(providers))]
pub async fn search_images(providers: &[Box<dyn SearchProvider>], query: &str) -> Vec<ImageHit> {
    let mut hits = match providers.first() {
        Some(primary) => run_engine(primary.as_ref(), query).await,
        None => Vec::new(),
    };
    if hits.len() >= 3 {
        return hits;
    }

    if let Some(secondary) = providers.get(1) {
        hits.extend(run_engine(secondary.as_ref(), query).await);
    }

    if hits.len() < 2 {
        let simplified: String = query
            .split_whitespace()
            .take(3)
            .collect::<Vec<_>>()
            .join(" ");
        debug!(%simplified, "too few hits; retrying with simplified query");
        for provider in providers {
            hits.extend(run_engine(provider.as_ref(), &simplified).await);
        }
    }

    hits
}

async fn run_engine(provider: &dyn SearchProvider, query: &str) -> Vec<ImageHit> {
    match provider.search(query).await {
        Ok(hits) => {
            debug!(engine = %provider.engine(), count = hits.len(), %query, "search completed");
            hits
        }
        Err(e) => {
            warn!(engine = %provider.engine(), error = %e, %query, "search failed; treating as empty");
            Vec::new()
        }
    }
}
