//! Prompt construction for title and article body generation.
//!
//! These templates drive the SEO shape of the output: keyword density,
//! heading hierarchy, image placeholder positions, and internal links to
//! related articles all come from the instructions built here.

use crate::models::RelatedArticle;
use std::fmt::Write;

/// Build the prompt for a catchy, SEO-optimized article title.
pub fn title_prompt(subject: &str, language: &str) -> String {
    format!(
        "Write a catchy and SEO-optimized article title in {language} about '{subject}'.\n\n\
         RULES:\n\
         1. Make it attention-grabbing and click-worthy without being clickbait\n\
         2. Include the main keyword \"{subject}\" or a closely related term\n\
         3. Keep it under 60 characters if possible\n\
         4. Make sure it's in {language} language\n\
         5. Add a subtitle separated by a colon or dash if appropriate\n\
         6. Do not include unnecessary punctuation or all caps\n\
         7. If the language is English, make the title more professional and concise\n\
         8. For English titles, use power words that drive engagement and clicks\n\n\
         FORMAT THE TITLE EXACTLY LIKE THIS (no extra text): Title Here"
    )
}

/// Build the long-form article body prompt.
///
/// `related` articles are listed for the model to link to with natural
/// anchor text. English is forced when the language says so or the subject
/// contains common marketing-industry terms.
pub fn article_prompt(
    title: &str,
    subject: &str,
    domain: &str,
    permalink: &str,
    language: &str,
    related: &[RelatedArticle],
) -> String {
    let mut related_links = String::new();
    if !related.is_empty() {
        related_links.push_str("RELATED ARTICLES TO INCLUDE:\n");
        for (i, article) in related.iter().enumerate() {
            let _ = writeln!(
                related_links,
                "{}. Title: \"{}\", Link: {}{}",
                i + 1,
                article.title,
                domain,
                article.permalink
            );
        }
        related_links.push_str(
            "Include these links naturally within the article content using relevant anchor \
             text that relates to both the keyword and the destination article.\n\n",
        );
    }

    let english_requirements = if force_english(subject, language) {
        "ENGLISH CONTENT REQUIREMENTS:\n\
         1. Write the entire article in professional, flawless English regardless of the keyword language.\n\
         2. Use precise terminology and industry-standard vocabulary.\n\
         3. Maintain a clear, authoritative tone that conveys expertise.\n\
         4. For technical topics, use proper technical terms and explain them clearly.\n\
         5. Use American English spelling and grammar conventions.\n\n"
    } else {
        ""
    };

    format!(
        "Write an extremely comprehensive and in-depth SEO-optimized article for the following title: \"{title}\"\n\n\
         FORMAT REQUIREMENTS:\n\
         1. Start with an engaging 3-4 paragraph introduction that includes the domain name '{domain}' as a BOLD HYPERLINK only ONCE in the first paragraph. Format it as [**{domain}**](https://{domain}). This automatically creates both bold and hyperlink.\n\
         2. Immediately after the introduction, insert an image placeholder with format: [IMAGE: {subject} overview infographic].\n\
         3. Create a deep hierarchical structure with H2, H3, and H4 headings (use markdown format: ##, ###, ####). START with H2 headings after the introduction, and use H3 and H4 for more detailed subsections.\n\
         4. Create a minimum of 4000 words (target range: 4000-7000 words) with detailed professional-level analysis for each heading section.\n\
         5. Bold 5-7 primary and secondary keywords related to '{subject}' throughout the article for SEO optimization. These should appear naturally in the text, especially at the beginning of paragraphs.\n\
         6. Include exactly 6-7 image placeholders throughout the article using format: [IMAGE: detailed description related to the heading], but ALWAYS place these image placeholders BEFORE their related headings, not after.\n\
         7. DO NOT include any image placeholders in the conclusion section or at the very end of the article.\n\
         8. End with a warm, personalized conclusion paragraph that directly addresses the reader, followed by a friendly call-to-action paragraph with a bold internal link to '[**{domain}{permalink}**](https://{domain}{permalink})' using the article title as anchor text.\n\n\
         {english_requirements}\
         {related_links}\
         CONTENT REQUIREMENTS:\n\
         1. Make each section extremely detailed, professional, and comprehensive - cover the topic '{subject}' with expert-level depth and analysis.\n\
         2. Include real-world examples, case studies, statistics, and actionable step-by-step instructions with specific details and metrics when possible.\n\
         3. Write in a professional, authoritative {language} tone that establishes genuine expertise. Address readers directly using 'you' and 'your' to increase engagement.\n\
         4. Add 6-8 external links to highly authoritative sources (major publications, university studies, industry leaders) with descriptive anchor text.\n\
         5. Maintain a keyword density of 2-3% for the main keyword '{subject}'. Aim for the main keyword to appear approximately 1-2 times per 100 words. This creates optimal density without keyword stuffing.\n\
         6. Heavily optimize for LSI (Latent Semantic Indexing) keywords by incorporating 10-15 semantically related terms to '{subject}' throughout the article. These should appear naturally within the content.\n\
         7. Create advanced internal linking: Convert 7-8 appropriate LSI keywords or phrases into internal links pointing to: [**{domain}/keyword-phrase**](https://{domain}/keyword-phrase) - replace spaces with hyphens in the URL portion.\n\
         8. For related articles provided, include links to them using descriptive anchor text that naturally fits within the content, with at least one link in each major section.\n\
         9. DO NOT include table of contents - start directly with the first major H2 section after the introduction and infographic.\n\
         10. Include multiple professional-quality formatted elements: 2-3 bulleted lists, 2-3 numbered lists, and at least one detailed comparison table or data table formatted with markdown.\n\
         11. Make each H2, H3, and H4 heading compelling, specific, and keyword-optimized. Follow SEO best practices: include numbers in some headings, use 'how to,' 'why,' or question formats in others, and keep headings under 60 characters.\n\
         12. For each heading section, start with a concise topic sentence that summarizes the section, followed by a detailed, data-backed explanation (250-400 words per H2 section).\n\
         13. Develop a clear hierarchy: Each H2 should have 2-3 H3 subsections, and at least one H3 should contain 1-2 H4 subsections for even more detailed analysis.\n\
         14. DO NOT include FAQ sections - directly incorporate questions and their detailed answers into the relevant sections as regular paragraphs and headings.\n\
         15. When mentioning specific tools, resources, or techniques, provide expert insights about their implementation, advantages, limitations, and competitive alternatives.\n\
         16. Include practical examples for immediate implementation in each section, with clear steps and expected outcomes.\n\
         17. Add current industry trends, future predictions backed by research, and expert insights in the relevant industry. Include recent statistics or developments where appropriate.\n\
         18. Create a logical flow between sections, with clear transitions that connect each topic to the main subject and to adjacent headings.\n\
         19. Ensure each H2 section is comprehensive enough to stand alone as a mini-article on its subtopic, while still contributing to the overall narrative.\n\
         20. If you want to include an image for the final section before conclusion, place it BEFORE the heading, not after it.\n\
         21. For technical or complex topics, include practical applications or simplified explanations to make the content accessible while maintaining its professional depth."
    )
}

/// Subjects in the digital-marketing orbit read badly in machine
/// translation, so they always get English content.
fn force_english(subject: &str, language: &str) -> bool {
    const ENGLISH_TERMS: &[&str] = &[
        "seo",
        "digital marketing",
        "google",
        "content marketing",
        "social media",
        "analytics",
    ];
    let subject = subject.to_lowercase();
    language.eq_ignore_ascii_case("english")
        || ENGLISH_TERMS.iter().any(|term| subject.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn related() -> Vec<RelatedArticle> {
        vec![RelatedArticle {
            title: "Older Piece".to_string(),
            permalink: "/older-piece".to_string(),
            score: 2,
        }]
    }

    #[test]
    fn test_title_prompt_carries_subject_and_language() {
        let prompt = title_prompt("rust tips", "English");
        assert!(prompt.contains("'rust tips'"));
        assert!(prompt.contains("in English"));
    }

    #[test]
    fn test_article_prompt_includes_related_links_block() {
        let prompt = article_prompt(
            "Great Title",
            "rust tips",
            "example.com",
            "/great-title",
            "English",
            &related(),
        );
        assert!(prompt.contains("RELATED ARTICLES TO INCLUDE:"));
        assert!(prompt.contains("example.com/older-piece"));
        assert!(prompt.contains("[**example.com/great-title**](https://example.com/great-title)"));
    }

    #[test]
    fn test_article_prompt_without_related_omits_block() {
        let prompt = article_prompt(
            "Great Title",
            "berkebun hidroponik",
            "example.com",
            "/great-title",
            "Indonesian",
            &[],
        );
        assert!(!prompt.contains("RELATED ARTICLES TO INCLUDE:"));
        assert!(!prompt.contains("ENGLISH CONTENT REQUIREMENTS:"));
    }

    #[test]
    fn test_force_english_on_marketing_subjects() {
        assert!(force_english("SEO untuk pemula", "Indonesian"));
        assert!(force_english("tips Google Analytics", "Indonesian"));
        assert!(force_english("anything", "english"));
        assert!(!force_english("berkebun hidroponik", "Indonesian"));
    }
}
