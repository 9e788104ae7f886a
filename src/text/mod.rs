//! Text post-processing: relative timestamp normalization and placeholder
//! glossary substitution.

pub mod glossary;
pub mod time;

pub use glossary::{parse_terms, placeholder, substitute, GlossaryTerm};
pub use time::normalize_relative;
