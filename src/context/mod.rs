//! Context domain: the environment snapshot produced by the screen sensor,
//! the single-writer store that holds it, and the text analysis that builds it.

pub mod analysis;
pub mod snapshot;
pub mod store;

pub use analysis::{classify_language, detect_error_indicators, extract_snippets, ScreenAnalyzer};
pub use snapshot::Context;
pub use store::ContextStore;
