//! Article generation orchestrator.
//!
//! Sequences one article end to end: title generation, related-article
//! lookup, body generation, image placeholder resolution, frontmatter
//! assembly, and post persistence. Each step is also callable on its own;
//! only generation-API exhaustion is a hard failure, everything image- or
//! search-shaped degrades inside its own step.

use crate::client::{GenError, HttpGenerator, RetryPolicy, RotatingClient, TextGenerator};
use crate::images::ImageManager;
use crate::links::{LinkStore, DEFAULT_MAX_RELATED};
use crate::models::{GeneratedArticle, RelatedArticle, Stage};
use crate::outputs::{frontmatter, post};
use crate::prompts;
use crate::utils::slugify;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Per-run settings for [`ArticleGenerator::generate_article`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// The blog's domain, used for internal links and image file names.
    pub domain: String,
    /// Language the article is written in. Language detection is the
    /// caller's concern; this defaults to English.
    pub language: String,
    /// Model used for the short title request.
    pub title_model: String,
    /// Model used for the long body request.
    pub article_model: String,
    /// Explicit category; the first subject word when absent.
    pub category: Option<String>,
    /// Publisher name recorded in the frontmatter.
    pub publisher: String,
    /// Directory the Jekyll post is written into.
    pub output_dir: PathBuf,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            language: "English".to_string(),
            title_model: "gemini-1.5-flash".to_string(),
            article_model: "gemini-1.5-flash".to_string(),
            category: None,
            publisher: "blogsmith".to_string(),
            output_dir: PathBuf::from("_posts"),
        }
    }
}

/// Wires the rotating client, link store, and image manager together.
pub struct ArticleGenerator<T: TextGenerator = HttpGenerator> {
    client: RotatingClient<T>,
    links: LinkStore,
    images: ImageManager,
}

impl ArticleGenerator<HttpGenerator> {
    /// Build the production generator: HTTP transport, Bing/Yahoo search,
    /// default retry policy.
    ///
    /// `api_base_url` overrides the generation endpoint, e.g. to route
    /// through a proxy.
    pub fn new(
        api_keys: Vec<String>,
        links_file: impl AsRef<Path>,
        images_dir: impl Into<PathBuf>,
        api_base_url: Option<&str>,
    ) -> Result<Self, Box<dyn Error>> {
        let mut transport = HttpGenerator::new()?;
        if let Some(base) = api_base_url {
            transport = transport.with_base_url(base);
        }
        Ok(Self::with_parts(
            RotatingClient::new(transport, api_keys, RetryPolicy::default()),
            LinkStore::open(links_file),
            ImageManager::with_http_stack(images_dir)?,
        ))
    }
}

impl<T: TextGenerator> ArticleGenerator<T> {
    pub fn with_parts(client: RotatingClient<T>, links: LinkStore, images: ImageManager) -> Self {
        Self {
            client,
            links,
            images,
        }
    }

    /// Generate an SEO title for `subject`, cleaned to a single line.
    #[instrument(level = "info", skip(self))]
    pub async fn generate_title(
        &mut self,
        subject: &str,
        language: &str,
        model: &str,
    ) -> Result<String, GenError> {
        let response = self
            .client
            .send(&prompts::title_prompt(subject, language), model)
            .await?;
        Ok(clean_title(&response))
    }

    /// Generate the article body, weaving in links to `related` articles.
    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "info", skip(self, related))]
    pub async fn generate_body(
        &mut self,
        title: &str,
        subject: &str,
        domain: &str,
        permalink: &str,
        language: &str,
        model: &str,
        related: &[RelatedArticle],
    ) -> Result<String, GenError> {
        self.client
            .send(
                &prompts::article_prompt(title, subject, domain, permalink, language, related),
                model,
            )
            .await
    }

    /// Prior articles relevant to `subject`, excluding `permalink` itself.
    pub fn related_articles(&self, subject: &str, permalink: &str) -> Vec<RelatedArticle> {
        self.links
            .related_articles(subject, permalink, DEFAULT_MAX_RELATED)
    }

    /// Number of articles the link store currently tracks.
    pub fn article_count(&self) -> usize {
        self.links.all_articles().len()
    }

    /// Record a finished article in the link store.
    pub fn add_article(
        &mut self,
        title: &str,
        subject: &str,
        permalink: &str,
    ) -> Result<bool, io::Error> {
        self.links.add_article(title, subject, permalink)
    }

    /// Resolve `[IMAGE: …]` placeholders in `text`.
    pub async fn resolve_placeholders(
        &self,
        text: &str,
        subject: &str,
        domain: &str,
    ) -> (String, Option<String>) {
        self.images.resolve_placeholders(text, subject, domain).await
    }

    /// Run the whole pipeline for one subject.
    ///
    /// `on_progress` is called as each stage completes; use
    /// [`Stage::percent`] for display.
    #[instrument(level = "info", skip(self, options, on_progress), fields(%subject))]
    pub async fn generate_article(
        &mut self,
        subject: &str,
        options: &GenerateOptions,
        mut on_progress: impl FnMut(Stage),
    ) -> Result<GeneratedArticle, Box<dyn Error>> {
        on_progress(Stage::Language);

        let title = self
            .generate_title(subject, &options.language, &options.title_model)
            .await?;
        on_progress(Stage::Title);

        let permalink = format!("/{}", slugify(&title));
        let related = self.related_articles(subject, &permalink);
        info!(%title, %permalink, related = related.len(), "generating body");

        let body = self
            .generate_body(
                &title,
                subject,
                &options.domain,
                &permalink,
                &options.language,
                &options.article_model,
                &related,
            )
            .await?;
        on_progress(Stage::Body);

        let (body, featured) = self
            .images
            .resolve_placeholders(&body, subject, &options.domain)
            .await;
        on_progress(Stage::Images);

        let fm = frontmatter::generate_frontmatter(
            &title,
            subject,
            &permalink,
            options.category.as_deref(),
            &options.publisher,
            featured.as_deref(),
        )?;
        let markdown = format!("{fm}{}", post::insert_more_tag(&body));

        let path = post::write_post(&options.output_dir, &title, &markdown).await?;
        on_progress(Stage::Saving);

        self.add_article(&title, subject, &permalink)?;

        info!(path = %path.display(), "article generated");
        Ok(GeneratedArticle {
            title,
            body,
            markdown,
            permalink,
            path,
        })
    }
}

/// Strip quotes and keep only the first line of a title response.
fn clean_title(response: &str) -> String {
    response
        .trim()
        .replace(['"', '\''], "")
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RequestError;
    use crate::images::{FetchError, ImageFetcher};
    use crate::models::{Engine, ImageHit};
    use crate::search::{SearchError, SearchProvider};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, RequestError>>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _model: &str,
            _key: &str,
        ) -> Result<String, RequestError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")
        }
    }

    struct EmptySearch;

    #[async_trait]
    impl SearchProvider for EmptySearch {
        fn engine(&self) -> Engine {
            Engine::Bing
        }

        async fn search(&self, _query: &str) -> Result<Vec<ImageHit>, SearchError> {
            Ok(Vec::new())
        }
    }

    struct NoopFetcher;

    #[async_trait]
    impl ImageFetcher for NoopFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(b"img".to_vec())
        }
    }

    fn generator_in(
        dir: &TempDir,
        script: Vec<Result<String, RequestError>>,
    ) -> ArticleGenerator<ScriptedGenerator> {
        let transport = ScriptedGenerator {
            script: Mutex::new(script.into()),
        };
        ArticleGenerator::with_parts(
            RotatingClient::new(
                transport,
                vec!["key-a".to_string(), "key-b".to_string()],
                RetryPolicy::default(),
            ),
            LinkStore::open(dir.path().join("article_links.json")),
            ImageManager::new(
                dir.path().join("assets"),
                vec![Box::new(EmptySearch)],
                Box::new(NoopFetcher),
            )
            .unwrap(),
        )
    }

    fn options_in(dir: &TempDir) -> GenerateOptions {
        GenerateOptions {
            output_dir: dir.path().join("_posts"),
            ..GenerateOptions::default()
        }
    }

    #[test]
    fn test_clean_title_strips_quotes_and_extra_lines() {
        assert_eq!(clean_title("\"Quoted Title\"\n\nRationale here"), "Quoted Title");
        assert_eq!(clean_title("  Plain Title  "), "Plain Title");
        assert_eq!(clean_title(""), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pipeline_produces_post_and_records_link() {
        let dir = TempDir::new().unwrap();
        let mut generator = generator_in(
            &dir,
            vec![
                Ok("Hydroponics at Home".to_string()),
                Ok("Intro paragraph.\n\n[IMAGE: hydroponics overview infographic]\n\n## More".to_string()),
            ],
        );
        let options = options_in(&dir);

        let mut stages = Vec::new();
        let article = generator
            .generate_article("hydroponic gardening", &options, |stage| stages.push(stage))
            .await
            .unwrap();

        assert_eq!(article.title, "Hydroponics at Home");
        assert_eq!(article.permalink, "/hydroponics-at-home");
        assert_eq!(
            stages,
            vec![
                Stage::Language,
                Stage::Title,
                Stage::Body,
                Stage::Images,
                Stage::Saving,
            ]
        );

        // Search found nothing, so the placeholder degraded to a comment.
        assert!(article
            .body
            .contains("<!-- Could not find image for: hydroponics overview infographic -->"));
        assert!(article.markdown.starts_with("---\n"));
        assert!(article.markdown.contains("<!--more-->"));

        let written = std::fs::read_to_string(&article.path).unwrap();
        assert_eq!(written, article.markdown);

        // The article is now available for future related-article lookups.
        let related = generator.related_articles("hydroponic setups", "/other");
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].permalink, "/hydroponics-at-home");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_propagates() {
        let dir = TempDir::new().unwrap();
        // Title request fails all retries on both tiers.
        let script = (0..10)
            .map(|_| Err(RequestError::EmptyResponse))
            .collect();
        let mut generator = generator_in(&dir, script);
        let options = GenerateOptions {
            title_model: "gemini-1.5-pro".to_string(),
            ..options_in(&dir)
        };

        let err = generator
            .generate_article("anything", &options, |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 5 attempts"));

        // Nothing was recorded for a failed article.
        assert!(generator.related_articles("anything", "/x").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_title_uses_title_prompt_response() {
        let dir = TempDir::new().unwrap();
        let mut generator = generator_in(
            &dir,
            vec![Ok("'Best Title': A Guide\nextra".to_string())],
        );
        let title = generator
            .generate_title("rust", "English", "gemini-1.5-flash")
            .await
            .unwrap();
        assert_eq!(title, "Best Title: A Guide");
    }
}
