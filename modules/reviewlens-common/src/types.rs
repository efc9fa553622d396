use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One AI-extracted tagged substring of a review's text.
///
/// No uniqueness or ordering invariant: duplicate and overlapping `text`
/// values are tolerated, and overlap resolution happens at highlight time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub sentiment: String,
    pub category: String,
    pub subcategory: String,
}

/// One grouped review record. Read-only after ingest; missing CSV values
/// are already normalized to empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub name: String,
    pub sex: String,
    pub idiom: String,
    pub image: String,
    pub review_title: String,
    pub review: String,
    pub translated_review: String,
    pub review_url: String,
    pub rate: String,
    pub date: String,
    pub num_reviews_usuario: String,
    pub fragments: Vec<Fragment>,
}

impl Review {
    /// The text that highlighting operates on: the translation when present,
    /// otherwise the original.
    pub fn display_text(&self) -> &str {
        if self.translated_review.is_empty() {
            &self.review
        } else {
            &self.translated_review
        }
    }
}
