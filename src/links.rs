//! Persisted store of generated articles used for internal linking.
//!
//! Every generated article is recorded here so later articles on similar
//! subjects can link back to it. Relevance is plain lexical overlap: the
//! number of words two subjects share, case-insensitive.
//!
//! The store is a single JSON file rewritten wholesale on every successful
//! add. A missing or corrupt file degrades to an empty store rather than
//! failing the pipeline.

use crate::models::{ArticleRecord, RelatedArticle};
use chrono::Local;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Default number of related articles fed into the body prompt.
pub const DEFAULT_MAX_RELATED: usize = 3;

/// Insertion-ordered article store backed by a flat JSON file.
#[derive(Debug)]
pub struct LinkStore {
    path: PathBuf,
    articles: Vec<ArticleRecord>,
}

impl LinkStore {
    /// Open the store at `path`, loading any existing records.
    ///
    /// Parse failures are logged and treated as an empty store; the file
    /// will be replaced on the next successful [`add_article`](Self::add_article).
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let articles = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<ArticleRecord>>(&raw) {
                Ok(articles) => articles,
                Err(e) => {
                    warn!(error = %e, "link store is corrupt; starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(error = %e, "link store unreadable; starting empty");
                Vec::new()
            }
        };
        info!(count = articles.len(), "loaded link store");
        Self { path, articles }
    }

    /// Record a new article; returns `false` without touching the file when
    /// the permalink is already present.
    pub fn add_article(
        &mut self,
        title: &str,
        subject: &str,
        permalink: &str,
    ) -> Result<bool, io::Error> {
        if self.articles.iter().any(|a| a.permalink == permalink) {
            info!(%permalink, "article already recorded; skipping");
            return Ok(false);
        }

        self.articles.push(ArticleRecord {
            title: title.to_string(),
            subject: subject.to_string(),
            permalink: permalink.to_string(),
            timestamp: Local::now().to_rfc3339(),
        });
        self.save()?;
        Ok(true)
    }

    /// Rewrite the whole store file from the in-memory records.
    fn save(&self) -> Result<(), io::Error> {
        let json = serde_json::to_string_pretty(&self.articles)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }

    /// Rank stored articles by word overlap with `subject`.
    ///
    /// The article matching `exclude_permalink` and articles sharing no
    /// words at all are omitted. Ties keep insertion order.
    pub fn related_articles(
        &self,
        subject: &str,
        exclude_permalink: &str,
        max_results: usize,
    ) -> Vec<RelatedArticle> {
        let subject_words: HashSet<String> = tokenize(subject);

        let mut scored: Vec<RelatedArticle> = self
            .articles
            .iter()
            .filter(|a| a.permalink != exclude_permalink)
            .filter_map(|a| {
                let overlap = tokenize(&a.subject).intersection(&subject_words).count();
                (overlap > 0).then(|| RelatedArticle {
                    title: a.title.clone(),
                    permalink: a.permalink.clone(),
                    score: overlap,
                })
            })
            .collect();

        // Vec::sort_by is stable, so equal scores retain encounter order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(max_results);
        scored
    }

    /// All records in insertion order.
    pub fn all_articles(&self) -> &[ArticleRecord] {
        &self.articles
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LinkStore {
        LinkStore::open(dir.path().join("article_links.json"))
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.all_articles().is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("article_links.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = LinkStore::open(&path);
        assert!(store.all_articles().is_empty());
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("article_links.json");

        let mut store = LinkStore::open(&path);
        assert!(store.add_article("Title", "rust tips", "/title").unwrap());

        let reloaded = LinkStore::open(&path);
        assert_eq!(reloaded.all_articles().len(), 1);
        assert_eq!(reloaded.all_articles()[0].subject, "rust tips");
    }

    #[test]
    fn test_duplicate_permalink_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        assert!(store.add_article("First", "subject a", "/dup").unwrap());
        assert!(!store.add_article("Second", "subject b", "/dup").unwrap());

        assert_eq!(store.all_articles().len(), 1);
        assert_eq!(store.all_articles()[0].title, "First");
    }

    #[test]
    fn test_related_excludes_current_and_zero_scores() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_article("A", "rust web tips", "/a").unwrap();
        store.add_article("B", "gardening advice", "/b").unwrap();
        store.add_article("C", "rust tips tricks", "/c").unwrap();

        let related = store.related_articles("rust tips", "/a", DEFAULT_MAX_RELATED);
        let permalinks: Vec<&str> = related.iter().map(|r| r.permalink.as_str()).collect();
        assert_eq!(permalinks, vec!["/c"]);
        assert_eq!(related[0].score, 2);
    }

    #[test]
    fn test_related_sorted_desc_with_stable_ties() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_article("Two1", "alpha beta", "/two1").unwrap();
        store.add_article("Two2", "beta alpha", "/two2").unwrap();
        store.add_article("One", "alpha gardening", "/one").unwrap();

        let related = store.related_articles("alpha beta gamma", "/none", 10);
        let scores: Vec<usize> = related.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![2, 2, 1]);
        // The two score-2 entries keep their insertion order.
        assert_eq!(related[0].permalink, "/two1");
        assert_eq!(related[1].permalink, "/two2");
    }

    #[test]
    fn test_related_truncates_to_max() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        for i in 0..6 {
            store
                .add_article(&format!("T{i}"), "shared subject", &format!("/p{i}"))
                .unwrap();
        }

        let related = store.related_articles("shared subject", "/none", DEFAULT_MAX_RELATED);
        assert_eq!(related.len(), 3);
    }

    #[test]
    fn test_scoring_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add_article("A", "RUST Tips", "/a").unwrap();

        let related = store.related_articles("rust tips", "/none", DEFAULT_MAX_RELATED);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].score, 2);
    }
}
