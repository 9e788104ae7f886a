//! Core data models for novels, chapters, and catalog listings.

mod novel;

pub use novel::{Chapter, Novel, NovelBuilder, NovelStatus, NovelSummary, SerialId};
