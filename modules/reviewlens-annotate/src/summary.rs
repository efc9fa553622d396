use reviewlens_common::Fragment;
use serde::Serialize;

use crate::sentiment::Sentiment;

/// Sentiment counts and distinct category labels over a review's fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Distinct non-empty category labels, in first-seen order.
    pub categories: Vec<String>,
}

impl AnalysisSummary {
    pub fn from_fragments(fragments: &[Fragment]) -> Self {
        let mut summary = Self::default();
        for frag in fragments {
            match Sentiment::from_raw(&frag.sentiment) {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Negative => summary.negative += 1,
                Sentiment::Neutral => summary.neutral += 1,
            }
            if !frag.category.is_empty() && !summary.categories.contains(&frag.category) {
                summary.categories.push(frag.category.clone());
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.positive == 0 && self.negative == 0 && self.neutral == 0
    }
}
