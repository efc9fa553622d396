pub mod highlight;
pub mod sentiment;
pub mod summary;

pub use highlight::highlight_fragments;
pub use sentiment::Sentiment;
pub use summary::AnalysisSummary;
