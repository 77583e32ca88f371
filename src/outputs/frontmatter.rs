//! Jekyll frontmatter generation and SEO tag extraction.
//!
//! Tags come from the title first (multi-word phrases score better with
//! search engines than single words) and the subject fills any remaining
//! slots, capped at five.

use chrono::Local;
use itertools::Itertools;
use serde::Serialize;

/// Words too common to be useful as tags, English and Indonesian.
const STOP_WORDS: &[&str] = &[
    "yang", "untuk", "dengan", "adalah", "dari", "cara", "tips", "trik", "dan", "atau", "jika",
    "maka", "namun", "tetapi", "juga", "oleh", "the", "and", "that", "this", "with", "for",
    "from", "how", "what", "when", "why", "where", "who", "will", "your", "their", "our", "its",
];

const MAX_TAGS: usize = 5;

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Extract up to five SEO tags from a title and subject.
///
/// Three-word phrases are most specific so they go first (up to 2), then
/// two-word phrases (up to 2), then single words longer than three
/// characters that are not already covered by a phrase.
pub fn generate_tags(title: &str, subject: &str) -> Vec<String> {
    let clean_title = title.to_lowercase().replace([':', '-', ',', '.'], " ");
    let clean_subject = subject.to_lowercase();
    let title_parts: Vec<&str> = clean_title.split_whitespace().collect();

    let phrases = |len: usize| -> Vec<String> {
        title_parts
            .windows(len)
            .filter(|w| w.iter().all(|word| !is_stop_word(word)))
            .map(|w| w.join(" "))
            .collect()
    };

    let mut tags: Vec<String> = Vec::new();
    tags.extend(phrases(3).into_iter().take(2));
    tags.extend(phrases(2).into_iter().take(2));

    if tags.len() < MAX_TAGS {
        let remaining = MAX_TAGS - tags.len();
        let singles = title_parts
            .iter()
            .copied()
            .chain(clean_subject.split_whitespace())
            .filter(|w| w.len() > 3 && !is_stop_word(w))
            .unique()
            .filter(|w| !tags.iter().any(|phrase| phrase.contains(w)))
            .take(remaining)
            .map(str::to_string)
            .collect::<Vec<_>>();
        tags.extend(singles);
    }

    tags.truncate(MAX_TAGS);
    if tags.is_empty() {
        let fallback = subject
            .split_whitespace()
            .next()
            .unwrap_or(subject)
            .to_string();
        tags.push(fallback);
    }
    tags
}

#[derive(Debug, Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    date: String,
    publisher: &'a str,
    layout: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    tag: Vec<String>,
    permalink: &'a str,
    categories: Vec<String>,
}

/// Build the YAML frontmatter block for a post, `---` fences included.
///
/// `category` defaults to the first word of the subject; `featured_image`
/// is omitted entirely when no image was resolved.
pub fn generate_frontmatter(
    title: &str,
    subject: &str,
    permalink: &str,
    category: Option<&str>,
    publisher: &str,
    featured_image: Option<&str>,
) -> Result<String, serde_yaml::Error> {
    let main_category = category
        .map(str::to_string)
        .unwrap_or_else(|| {
            subject
                .split_whitespace()
                .next()
                .unwrap_or(subject)
                .to_string()
        });

    let frontmatter = Frontmatter {
        title,
        date: Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        publisher,
        layout: "post",
        image: featured_image,
        tag: generate_tags(title, subject),
        permalink,
        categories: vec![main_category],
    };

    let yaml = serde_yaml::to_string(&frontmatter)?;
    Ok(format!("---\n{yaml}---\n\n"))
}
