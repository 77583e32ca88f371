//! Image placeholder resolution engine.
//!
//! Generated article bodies carry markers of the form `[IMAGE: description]`.
//! This module resolves each marker to a real image: it searches the web
//! engines in [`crate::search`], downloads the best candidate into the local
//! assets directory, and rewrites the marker into a markdown image tag.
//!
//! Resolution is deliberately lossy rather than fragile. A placeholder that
//! cannot be resolved degrades to an inline HTML comment; it never aborts
//! the article, and one placeholder's failure never stops the others from
//! being processed. The first placeholder that does resolve becomes the
//! article's featured image.
//!
//! # Fallback chain per placeholder
//!
//! 1. Search `subject description`, then `description`, then `subject`,
//!    then `subject image` until any engine returns candidates.
//! 2. Prefer the first candidate whose URL looks like an image file, else
//!    take the first candidate.
//! 3. Download it; on failure reuse a previously downloaded asset
//!    (most recent first, random among recent ones for later failures).
//! 4. With no candidates or no local assets, leave an explanatory comment.

use crate::models::ImageHit;
use crate::search::{search_images, BingImages, SearchProvider, YahooImages, SEARCH_TIMEOUT};
use crate::utils::{random_user_agent, slugify, truncate_chars};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::prelude::IndexedRandom;
use regex::Regex;
use reqwest::header::USER_AGENT;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[IMAGE: (.*?)\]").unwrap());

/// File extensions recognized as reusable local images.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// How many recent assets the download-failure fallback picks among.
const FALLBACK_POOL_SIZE: usize = 5;

/// Maximum length of the slug portion of a stored image file name.
const MAX_SLUG_LEN: usize = 40;

/// A single image download failing. Contained per placeholder.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("could not store image: {0}")]
    Io(#[from] io::Error),
}

/// Downloads raw image bytes. Abstracted so tests can run without a network.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reqwest-backed [`ImageFetcher`].
#[derive(Debug)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Resolves `[IMAGE: …]` placeholders against the search engines and the
/// local assets directory.
pub struct ImageManager {
    images_dir: PathBuf,
    providers: Vec<Box<dyn SearchProvider>>,
    fetcher: Box<dyn ImageFetcher>,
}

impl ImageManager {
    /// Create a manager over `images_dir`, creating the directory if needed.
    ///
    /// `providers` are queried in order (primary first).
    pub fn new(
        images_dir: impl Into<PathBuf>,
        providers: Vec<Box<dyn SearchProvider>>,
        fetcher: Box<dyn ImageFetcher>,
    ) -> io::Result<Self> {
        let images_dir = images_dir.into();
        std::fs::create_dir_all(&images_dir)?;
        Ok(Self {
            images_dir,
            providers,
            fetcher,
        })
    }

    /// Convenience constructor wiring Bing, Yahoo, and the HTTP fetcher.
    pub fn with_http_stack(images_dir: impl Into<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let providers: Vec<Box<dyn SearchProvider>> = vec![
            Box::new(BingImages::new()?),
            Box::new(YahooImages::new()?),
        ];
        Ok(Self::new(images_dir, providers, Box::new(HttpFetcher::new()?))?)
    }

    /// Replace every image placeholder in `article`, returning the rewritten
    /// text and the featured image path, if one was resolved.
    ///
    /// This never fails: each placeholder independently degrades to an
    /// inline comment when search, download, and local fallback all come up
    /// empty.
    #[instrument(level = "info", skip(self, article), fields(%subject, %domain))]
    pub async fn resolve_placeholders(
        &self,
        article: &str,
        subject: &str,
        domain: &str,
    ) -> (String, Option<String>) {
        let descriptions: Vec<String> = PLACEHOLDER_RE
            .captures_iter(article)
            .map(|cap| cap[1].to_string())
            .collect();

        if descriptions.is_empty() {
            // Nothing to rewrite; reuse the freshest local asset as the
            // featured image when one exists.
            let featured = self
                .existing_images(1)
                .unwrap_or_default()
                .into_iter()
                .next();
            return (article.to_string(), featured);
        }

        info!(count = descriptions.len(), "resolving image placeholders");

        let mut modified = article.to_string();
        let mut featured: Option<String> = None;
        let mut failed_downloads = 0usize;

        for (i, description) in descriptions.iter().enumerate() {
            let placeholder = format!("[IMAGE: {description}]");
            let (replacement, resolved_path) = match self
                .resolve_one(description, subject, domain, i, &mut failed_downloads)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(%description, error = %e, "placeholder resolution errored; degrading to comment");
                    (
                        format!("<!-- Error finding image: {description} - {e} -->"),
                        None,
                    )
                }
            };
            if featured.is_none() {
                featured = resolved_path;
            }
            modified = modified.replace(&placeholder, &replacement);
        }

        (modified, featured)
    }

    /// Resolve a single placeholder to its replacement text and, when an
    /// image was obtained, the site path that may become the featured image.
    async fn resolve_one(
        &self,
        description: &str,
        subject: &str,
        domain: &str,
        index: usize,
        failed_downloads: &mut usize,
    ) -> Result<(String, Option<String>), io::Error> {
        let mut images = self.query(&format!("{subject} {description}")).await;

        // Progressively more generic queries when the specific one is dry.
        let mut attempts = 0;
        while images.is_empty() && attempts < 3 {
            attempts += 1;
            let query = match attempts {
                1 => description.to_string(),
                2 => subject.to_string(),
                _ => format!("{subject} image"),
            };
            images = self.query(&query).await;
        }

        if images.is_empty() {
            info!(%description, "no candidates from any engine or query");
            return Ok((
                format!("<!-- Could not find image for: {description} -->"),
                None,
            ));
        }

        let chosen = select_candidate(&images);
        let filename = image_filename(subject, description, domain, index);
        let file_path = self.images_dir.join(&filename);

        match self.download_to(&chosen.url, &file_path).await {
            Ok(()) => {
                let site = self.site_path(&filename);
                info!(url = %chosen.url, engine = %chosen.source, path = %site, "image downloaded");
                let tag = format!("![{description}]({site})");
                Ok((tag, Some(site)))
            }
            Err(e) => {
                warn!(url = %chosen.url, error = %e, "download failed; falling back to existing assets");
                *failed_downloads += 1;
                let assets = self.existing_images(FALLBACK_POOL_SIZE)?;
                if assets.is_empty() {
                    return Ok((
                        format!("<!-- Image for {description} could not be retrieved -->"),
                        None,
                    ));
                }
                // First failure takes the freshest asset; later failures pick
                // randomly so repeated fallbacks do not all show one image.
                let pick = if *failed_downloads == 1 {
                    assets[0].clone()
                } else {
                    assets
                        .choose(&mut rand::rng())
                        .cloned()
                        .unwrap_or_else(|| assets[0].clone())
                };
                Ok((format!("![{description}]({pick})"), Some(pick)))
            }
        }
    }

    /// Run one search and drop hits whose scraped URL does not parse.
    /// Result-page markup drifts; a mangled capture must not reach the
    /// downloader.
    async fn query(&self, query: &str) -> Vec<ImageHit> {
        let mut hits = search_images(&self.providers, query).await;
        hits.retain(|img| Url::parse(&img.url).is_ok());
        hits
    }

    /// Download `url` and store it whole at `path`.
    async fn download_to(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = self.fetcher.fetch(url).await?;
        // Single whole-buffer write; a failed download never leaves a
        // truncated file behind.
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Local images as site-root paths, most recently modified first.
    pub fn existing_images(&self, count: usize) -> Result<Vec<String>, io::Error> {
        let mut files: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in std::fs::read_dir(&self.images_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
                let modified = entry
                    .metadata()?
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((entry.path(), modified));
            }
        }
        files.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(files
            .into_iter()
            .take(count)
            .filter_map(|(path, _)| {
                path.file_name()
                    .map(|name| self.site_path(&name.to_string_lossy()))
            })
            .collect())
    }

    /// Site-root path (single leading slash) for a file in the assets dir.
    fn site_path(&self, filename: &str) -> String {
        let dir = self.images_dir.to_string_lossy();
        format!("/{}/{}", dir.trim_start_matches('/'), filename)
    }
}

/// Pick the first candidate whose URL looks like an image file, else the
/// first candidate whatever its form.
fn select_candidate(images: &[ImageHit]) -> &ImageHit {
    images
        .iter()
        .find(|img| looks_like_image_url(&img.url))
        .unwrap_or(&images[0])
}

fn looks_like_image_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.ends_with(".jpg")
        || lower.ends_with(".jpeg")
        || lower.ends_with(".png")
        || lower.ends_with(".gif")
        || lower.contains(".jpg?")
        || lower.contains(".jpeg?")
        || lower.contains(".png?")
        || lower.contains("/photo/")
        || lower.contains("/image/")
}

/// Deterministic asset file name: `slug(subject-description)` capped at 40
/// chars, domain with dots hyphenated, 1-based placeholder ordinal.
fn image_filename(subject: &str, description: &str, domain: &str, index: usize) -> String {
    let keyword = truncate_chars(&slugify(&format!("{subject}-{description}")), MAX_SLUG_LEN);
    let domain_part = domain.replace('.', "-");
    format!("{keyword}-{domain_part}-{}.jpg", index + 1)
}
