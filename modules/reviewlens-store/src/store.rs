use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use reviewlens_common::Review;

use crate::ingest::load_reviews;

/// Outcome of the startup load. A failed load is held as state rather than
/// aborting the process: the server still answers, reporting the error.
pub enum StoreState {
    Loaded {
        reviews: Vec<Review>,
        loaded_at: DateTime<Utc>,
    },
    Failed(String),
}

/// In-memory review collection, loaded once at startup and immutable after.
pub struct ReviewStore {
    state: StoreState,
}

impl ReviewStore {
    /// Load the CSV at `path`, capturing any failure as store state.
    pub fn load(path: &Path) -> Self {
        match load_reviews(path) {
            Ok(reviews) => {
                info!(reviews = reviews.len(), "Review store ready");
                Self {
                    state: StoreState::Loaded {
                        reviews,
                        loaded_at: Utc::now(),
                    },
                }
            }
            Err(e) => {
                let message = format!("Error loading data: {e}");
                error!(error = %e, "Review store failed to load");
                Self {
                    state: StoreState::Failed(message),
                }
            }
        }
    }

    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        Self {
            state: StoreState::Loaded {
                reviews,
                loaded_at: Utc::now(),
            },
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: StoreState::Failed(message.into()),
        }
    }

    /// All reviews in store order, or the startup error message.
    pub fn reviews(&self) -> Result<&[Review], &str> {
        match &self.state {
            StoreState::Loaded { reviews, .. } => Ok(reviews),
            StoreState::Failed(message) => Err(message),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Review> {
        self.reviews().ok()?.iter().find(|r| r.id == id)
    }

    pub fn count(&self) -> usize {
        self.reviews().map(<[Review]>::len).unwrap_or(0)
    }

    pub fn startup_error(&self) -> Option<&str> {
        match &self.state {
            StoreState::Loaded { .. } => None,
            StoreState::Failed(message) => Some(message),
        }
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            StoreState::Loaded { loaded_at, .. } => Some(*loaded_at),
            StoreState::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_disk_populates_the_store() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "review,name,subcategory_fragment,subcategory_sentiment\n\
             Nice place,Flo,nice place,positive\n"
        )
        .expect("write fixture");

        let store = ReviewStore::load(file.path());
        assert_eq!(store.count(), 1);
        assert!(store.startup_error().is_none());
        assert!(store.loaded_at().is_some());

        let reviews = store.reviews().expect("loaded");
        assert_eq!(reviews[0].name, "Flo");
        assert!(store.get(reviews[0].id).is_some());
    }

    #[test]
    fn missing_file_becomes_failed_state() {
        let store = ReviewStore::load(Path::new("/nonexistent/reviews.csv"));
        assert_eq!(store.count(), 0);
        let message = store.startup_error().expect("failed state");
        assert!(message.contains("data file not found at"), "got: {message}");
        assert!(store.reviews().is_err());
        assert!(store.loaded_at().is_none());
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = ReviewStore::from_reviews(vec![]);
        assert!(store.get(Uuid::new_v4()).is_none());
    }
}
