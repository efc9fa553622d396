use serde::{Deserialize, Serialize};

/// Sentiment class derived from a fragment's raw sentiment string.
/// Neutral is the default bucket for anything unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

impl Sentiment {
    /// Loose, case-insensitive classing of a raw sentiment value.
    /// Accepts substrings ("pos"/"neg") as well as the numeric codes the
    /// annotation pipeline emits ("1", "0", "-1"). Positive is checked first.
    pub fn from_raw(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        if s.contains("pos") || s == "1" {
            Sentiment::Positive
        } else if s.contains("neg") || s == "0" || s == "-1" {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// CSS class used by the highlighter spans.
    pub fn highlight_class(&self) -> &'static str {
        match self {
            Sentiment::Positive => "highlight-positive",
            Sentiment::Negative => "highlight-negative",
            Sentiment::Neutral => "highlight-neutral",
        }
    }
}
