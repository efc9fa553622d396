pub mod ingest;
pub mod store;

pub use ingest::load_reviews;
pub use store::{ReviewStore, StoreState};
