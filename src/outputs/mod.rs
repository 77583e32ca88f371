//! Output generation for Jekyll-style markdown posts.
//!
//! # Submodules
//!
//! - [`frontmatter`]: YAML frontmatter and SEO tag extraction
//! - [`post`]: Post file assembly and writing
//!
//! # Output Structure
//!
//! ```text
//! _posts/
//! └── 2025-05-06-my-article-title.md   # frontmatter + body
//! assets/image/
//! └── my-subject-…-example-com-1.jpg   # downloaded images
//! article_links.json                   # link store for internal linking
//! ```

pub mod frontmatter;
pub mod post;
