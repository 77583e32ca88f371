//! Command-line interface definitions for blogsmith.
//!
//! All options can be provided via command-line flags; the credential and
//! blog-identity options also read environment variables.

use clap::Parser;

/// Command-line arguments for the blogsmith article generator.
///
/// Subjects come from positional arguments, a subjects file, or both; each
/// subject produces one article.
///
/// # Examples
///
/// ```sh
/// # One-off article
/// blogsmith "indoor hydroponic gardening"
///
/// # Batch run from a file, custom output layout
/// blogsmith --subjects-file subjects.txt -o ./_posts --images-dir assets/images
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Subjects to generate articles for, one article each
    pub subjects: Vec<String>,

    /// File with additional subjects, one per line
    #[arg(short, long)]
    pub subjects_file: Option<String>,

    /// Blog domain, used in internal links and image file names
    #[arg(short, long, env = "BLOG_DOMAIN", default_value = "example.com")]
    pub domain: String,

    /// Output directory for generated Jekyll posts
    #[arg(short, long, default_value = "_posts")]
    pub output_dir: String,

    /// Directory downloaded images are stored in
    #[arg(long, default_value = "assets/images")]
    pub images_dir: String,

    /// JSON file tracking published articles for internal linking
    #[arg(long, default_value = "article_links.json")]
    pub links_file: String,

    /// File with Gemini API keys, one per line
    #[arg(long, env = "GEMINI_API_KEYS_FILE", default_value = "gemini_api_keys.txt")]
    pub api_keys_file: String,

    /// Override the generation API base URL (e.g. a local proxy)
    #[arg(long, env = "GEMINI_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Model used for title generation
    #[arg(long, env = "TITLE_MODEL", default_value = "gemini-1.5-flash")]
    pub title_model: String,

    /// Model used for article body generation
    #[arg(long, env = "ARTICLE_MODEL", default_value = "gemini-1.5-flash")]
    pub article_model: String,

    /// Language the articles are written in
    #[arg(short, long, default_value = "English")]
    pub language: String,

    /// Publisher name recorded in post frontmatter
    #[arg(long, env = "BLOG_PUBLISHER", default_value = "blogsmith")]
    pub publisher: String,

    /// Explicit category; defaults to the first word of each subject
    #[arg(long)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["blogsmith", "rust web frameworks"]);

        assert_eq!(cli.subjects, vec!["rust web frameworks"]);
        assert_eq!(cli.output_dir, "_posts");
        assert_eq!(cli.images_dir, "assets/images");
        assert_eq!(cli.links_file, "article_links.json");
        assert_eq!(cli.language, "English");
        assert!(cli.category.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "blogsmith",
            "--subjects-file",
            "subjects.txt",
            "-d",
            "blog.example.id",
            "-o",
            "/tmp/posts",
            "--category",
            "gardening",
        ]);

        assert_eq!(cli.subjects_file.as_deref(), Some("subjects.txt"));
        assert_eq!(cli.domain, "blog.example.id");
        assert_eq!(cli.output_dir, "/tmp/posts");
        assert_eq!(cli.category.as_deref(), Some("gardening"));
        assert!(cli.subjects.is_empty());
    }
}
