//! # Blogsmith
//!
//! An SEO blog-article generator that turns a list of subjects into
//! publish-ready Jekyll posts, using the Gemini generation API behind a
//! key-rotating, rate-limit-aware client.
//!
//! ## Features
//!
//! - Rotates through a pool of API keys, backing off exponentially on 429s
//!   and falling back from `gemini-1.5-pro` to `gemini-1.5-flash`
//! - Weaves links to previously generated articles into each new body
//! - Resolves `[IMAGE: …]` placeholders via Bing and Yahoo image search,
//!   downloading assets locally with layered fallbacks
//! - Emits complete posts: YAML frontmatter, tags, `<!--more-->` excerpt
//!   marker, dated file names
//!
//! ## Usage
//!
//! ```sh
//! blogsmith "urban beekeeping" --domain blog.example.id -o ./_posts
//! ```
//!
//! ## Architecture
//!
//! One article flows through a fixed pipeline:
//! 1. **Title**: short model request, cleaned to a single line
//! 2. **Body**: long model request carrying related-article links
//! 3. **Images**: placeholder resolution with per-placeholder degradation
//! 4. **Output**: frontmatter assembly and post write, then the link store
//!    is updated so later articles can point back here

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod client;
mod generator;
mod images;
mod links;
mod models;
mod outputs;
mod prompts;
mod search;
mod utils;

use cli::Cli;
use generator::{ArticleGenerator, GenerateOptions};
use utils::{ensure_writable_dir, load_api_keys, read_subjects_file, validate_api_key};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("blogsmith starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.images_dir, ?args.links_file, "Parsed CLI arguments");

    // Early check: ensure the posts output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Collect subjects ----
    let mut subjects = args.subjects.clone();
    if let Some(ref path) = args.subjects_file {
        let from_file = read_subjects_file(path);
        if from_file.is_empty() {
            warn!(path = %path, "subjects file was empty or unreadable");
        }
        subjects.extend(from_file);
    }
    if subjects.is_empty() {
        error!("no subjects given; pass them as arguments or via --subjects-file");
        return Err("no subjects to generate".into());
    }
    info!(count = subjects.len(), "subjects collected");

    // ---- Load and validate API keys ----
    let keys: Vec<String> = load_api_keys(&args.api_keys_file)
        .into_iter()
        .filter(|key| {
            let ok = validate_api_key(key);
            if !ok {
                warn!("skipping malformed API key in pool");
            }
            ok
        })
        .collect();
    if keys.is_empty() {
        error!(path = %args.api_keys_file, "no usable API keys");
        return Err("no usable API keys".into());
    }
    info!(count = keys.len(), "API key pool loaded");

    // ---- Build the generator ----
    let mut generator = ArticleGenerator::new(
        keys,
        &args.links_file,
        &args.images_dir,
        args.api_base_url.as_deref(),
    )?;
    let options = GenerateOptions {
        domain: args.domain.clone(),
        language: args.language.clone(),
        title_model: args.title_model.clone(),
        article_model: args.article_model.clone(),
        category: args.category.clone(),
        publisher: args.publisher.clone(),
        output_dir: args.output_dir.clone().into(),
    };

    // ---- Generate, one subject at a time ----
    // Sequential on purpose: the key pool cooldown paces API usage, and the
    // link store must see each article before the next body is written.
    let mut generated = 0usize;
    let mut failed = 0usize;
    for subject in &subjects {
        info!(%subject, "generating article");
        let outcome = generator
            .generate_article(subject, &options, |stage| {
                info!(%subject, stage = %format!("{stage:?}").to_lowercase(), percent = stage.percent(), "progress");
            })
            .await;
        match outcome {
            Ok(article) => {
                generated += 1;
                info!(
                    %subject,
                    title = %article.title,
                    path = %article.path.display(),
                    "article complete"
                );
            }
            Err(e) => {
                failed += 1;
                error!(%subject, error = %e, "article generation failed; continuing with next subject");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        generated,
        failed,
        total_tracked = generator.article_count(),
        elapsed_secs = elapsed.as_secs(),
        "blogsmith run complete"
    );

    if generated == 0 {
        return Err("every article failed to generate".into());
    }
    Ok(())
}
