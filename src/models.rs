//! Data carried through the pipeline, from extracted page to persisted record.
//!
//! - [`ExtractedArticle`]: raw title and body text pulled out of a page
//! - [`NormalizedArticle`]: cleaned title and combined text
//! - [`CorpusRecord`]: one line of the output JSON Lines corpus

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title and body text located in a page by the extractor.
///
/// The title is always longer than 10 characters and never contains the
/// site's blocked-page marker; the body is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub raw_content: String,
}

/// Cleaned article text ready for qualification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArticle {
    /// The cleaned title.
    pub title: String,
    /// `"<title>. <content>"`, trimmed.
    pub text: String,
}

impl NormalizedArticle {
    pub fn new(title: String, content: &str) -> Self {
        let text = format!("{title}. {content}").trim().to_string();
        Self { title, text }
    }
}

/// A fully qualified article as written to the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CorpusRecord {
    pub id: String,
    pub language: String,
    pub source_url: String,
    pub title: String,
    pub text: String,
    pub clean_status: String,
    pub category: String,
}

impl CorpusRecord {
    /// Build a record with a fresh v4 id.
    pub fn new(source_url: &str, article: NormalizedArticle) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            language: "vi".to_string(),
            source_url: source_url.to_string(),
            title: article.title,
            text: article.text,
            clean_status: "clean".to_string(),
            category: "news".to_string(),
        }
    }
}
