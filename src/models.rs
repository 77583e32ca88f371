//! Data models shared across the article generation pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: A previously generated article as persisted in the link store
//! - [`RelatedArticle`]: A scored match returned by the relevance linker
//! - [`ImageHit`]: A single image search result from one of the search engines
//! - [`GeneratedArticle`]: The final output of a full generation run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A generated article as stored in the link store for internal linking.
///
/// Records are insertion-ordered and keyed by `permalink`; inserting a
/// record whose permalink already exists is a no-op.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The generated article title.
    pub title: String,
    /// The subject/keyword the article was generated for.
    pub subject: String,
    /// Site-relative permalink, e.g. `/my-article-title`. Unique key.
    pub permalink: String,
    /// RFC 3339 timestamp of when the article was recorded.
    pub timestamp: String,
}

/// A prior article scored against a new subject by word overlap.
///
/// Produced by [`crate::links::LinkStore::related_articles`] and fed into
/// the body prompt so the model can weave in internal links.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedArticle {
    /// Title of the related article.
    pub title: String,
    /// Permalink of the related article.
    pub permalink: String,
    /// Number of subject words shared with the new subject.
    pub score: usize,
}

/// The search engine an [`ImageHit`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Engine {
    /// Bing image search (primary).
    Bing,
    /// Yahoo image search (secondary).
    Yahoo,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Bing => write!(f, "Bing"),
            Engine::Yahoo => write!(f, "Yahoo"),
        }
    }
}

/// A single image search result.
#[derive(Debug, Clone)]
pub struct ImageHit {
    /// The image URL as extracted from the engine's result markup.
    pub url: String,
    /// A synthetic title derived from the query.
    pub title: String,
    /// Which engine produced this hit.
    pub source: Engine,
}

/// The final output of [`crate::generator::ArticleGenerator::generate_article`].
#[derive(Debug)]
pub struct GeneratedArticle {
    /// The generated title.
    pub title: String,
    /// Article body with image placeholders replaced.
    pub body: String,
    /// Full markdown document including frontmatter.
    pub markdown: String,
    /// Site-relative permalink derived from the title.
    pub permalink: String,
    /// Path of the written Jekyll post file.
    pub path: PathBuf,
}

/// Pipeline stages reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Language,
    Title,
    Body,
    Images,
    Saving,
}

impl Stage {
    /// Approximate completion percentage when this stage finishes.
    pub fn percent(self) -> u8 {
        match self {
            Stage::Language => 30,
            Stage::Title => 40,
            Stage::Body => 60,
            Stage::Images => 80,
            Stage::Saving => 90,
        }
    }
}
