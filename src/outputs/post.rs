//! Jekyll post assembly and writing.

use crate::utils::slugify;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Insert the Jekyll excerpt separator after the first paragraph.
pub fn insert_more_tag(article: &str) -> String {
    match article.split_once("\n\n") {
        Some((first, rest)) => format!("{first}\n\n<!--more-->\n\n{rest}"),
        None => format!("{article}\n\n<!--more-->\n\n"),
    }
}

/// Write the finished markdown document as a date-prefixed Jekyll post.
///
/// The whole document is written in one call; a failed write never leaves
/// a truncated post behind.
#[instrument(level = "info", skip(markdown), fields(output_dir = %output_dir.display(), %title))]
pub async fn write_post(output_dir: &Path, title: &str, markdown: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(output_dir).await?;
    let filename = format!("{}{}.md", Local::now().format("%Y-%m-%d-"), slugify(title));
    let path = output_dir.join(filename);
    fs::write(&path, markdown).await?;
    info!(path = %path.display(), bytes = markdown.len(), "wrote post");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_more_tag_after_first_paragraph() {
        let article = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(
            insert_more_tag(article),
            "First paragraph.\n\n<!--more-->\n\nSecond paragraph."
        );
    }

    #[test]
    fn test_more_tag_on_single_paragraph() {
        assert_eq!(insert_more_tag("Only one."), "Only one.\n\n<!--more-->\n\n");
    }

    #[tokio::test]
    async fn test_write_post_creates_dated_file() {
        let dir = TempDir::new().unwrap();
        let posts = dir.path().join("_posts");

        let path = write_post(&posts, "My Great Title!", "# body")
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-my-great-title.md"));
        // YYYY-MM-DD- prefix.
        assert!(name.matches('-').count() >= 5);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# body");
    }
}
