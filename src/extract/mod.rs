//! Multi-channel novel extraction.
//!
//! A fetched novel document exposes the same record through several
//! unreliable channels. Extraction runs an ordered chain of strategies over
//! the document and takes the first one that produces a usable result:
//!
//! 1. [`hydration`]: the embedded client-hydration data blob, when present
//!    and well-formed, carrying the backend identifier and whatever metadata
//!    fields it exposes.
//! 2. [`markup`]: selector-based scraping of the rendered document, each
//!    field resolved through its own ordered candidate chain.
//!
//! This is whole-record fallback: once the hydration strategy yields an
//! identifier, its fields are used exclusively and the markup strategy never
//! runs. A malformed or absent blob is a strategy failure, not an error.

pub mod catalog;
pub mod content;
pub mod envelope;
pub mod hydration;
pub mod markup;

pub use markup::ScrapeProfile;

use scraper::Html;

use crate::models::{Novel, SerialId};

/// Errors surfaced by the extraction and aggregation core.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No extraction strategy produced a usable content identifier;
    /// fatal to chapter aggregation
    #[error("no extraction strategy produced a content identifier")]
    MissingIdentifier,

    /// A structured payload failed to decode or lacked expected fields;
    /// recoverable, drives the next fallback strategy
    #[error("parse error: {0}")]
    Parse(String),

    /// A single page or window request failed
    #[error("fetch failed at page/window {at}: {reason}")]
    PageFetch { at: u32, reason: String },

    /// Chapter text resolved to zero extractable content
    #[error("chapter resolved to empty content")]
    EmptyContent,

    /// The side-channel glossary lookup failed or returned nothing usable;
    /// non-fatal, placeholders are left unresolved
    #[error("glossary resolution failed: {0}")]
    Glossary(String),

    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered but rejected the request
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        ExtractError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Parse(format!("JSON: {}", err))
    }
}

/// Uniform outcome of one extraction strategy.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// The strategy produced a record, possibly with the backend identifier
    Found {
        novel: Novel,
        serial: Option<SerialId>,
    },
    /// The strategy had nothing usable; try the next one
    NotFound,
}

impl Extraction {
    /// Whether this outcome carries a record.
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found { .. })
    }
}

/// One extraction strategy: a pure function of the parsed document.
pub(crate) type Strategy<'a> = &'a dyn Fn(&Html) -> Extraction;

/// Run strategies in order, returning the first `Found`.
pub(crate) fn first_found(strategies: &[Strategy<'_>], doc: &Html) -> Extraction {
    for strategy in strategies {
        let outcome = strategy(doc);
        if outcome.is_found() {
            return outcome;
        }
    }
    Extraction::NotFound
}

/// Extract a novel record and identifier from one fetched document.
///
/// Strategies run in fixed priority order: hydration blob first, selector
/// scraping second. The hydration strategy only wins when it carries the
/// backend identifier; otherwise the whole record falls back to markup.
pub fn extract_novel(doc: &Html, path: &str, profile: &ScrapeProfile) -> Extraction {
    first_found(
        &[
            &|d| hydration::from_document(d, path),
            &|d| markup::scrape_novel(d, path, profile),
        ],
        doc,
    )
}

/// Extract a record and require the identifier.
///
/// Convenience over [`extract_novel`] for callers that cannot proceed
/// without aggregation: reports [`ExtractError::MissingIdentifier`] when no
/// strategy yielded one.
pub fn identify(doc: &Html, path: &str, profile: &ScrapeProfile) -> Result<(Novel, SerialId), ExtractError> {
    match extract_novel(doc, path, profile) {
        Extraction::Found {
            novel,
            serial: Some(serial),
        } => Ok((novel, serial)),
        _ => Err(ExtractError::MissingIdentifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NovelBuilder;
    use std::cell::Cell;

    fn found(name: &str) -> Extraction {
        Extraction::Found {
            novel: NovelBuilder::new("p", name).build(),
            serial: None,
        }
    }

    #[test]
    fn test_chain_stops_at_first_found() {
        let doc = Html::parse_document("<html></html>");
        let first_calls = Cell::new(0);
        let second_calls = Cell::new(0);

        let outcome = first_found(
            &[
                &|_| {
                    first_calls.set(first_calls.get() + 1);
                    found("from first")
                },
                &|_| {
                    second_calls.set(second_calls.get() + 1);
                    found("from second")
                },
            ],
            &doc,
        );

        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0);
        match outcome {
            Extraction::Found { novel, .. } => assert_eq!(novel.name, "from first"),
            Extraction::NotFound => panic!("expected a record"),
        }
    }

    #[test]
    fn test_chain_falls_through_not_found() {
        let doc = Html::parse_document("<html></html>");
        let second_calls = Cell::new(0);

        let outcome = first_found(
            &[
                &|_| Extraction::NotFound,
                &|_| {
                    second_calls.set(second_calls.get() + 1);
                    found("fallback")
                },
            ],
            &doc,
        );

        assert_eq!(second_calls.get(), 1);
        assert!(outcome.is_found());
    }

    #[test]
    fn test_chain_exhausted() {
        let doc = Html::parse_document("<html></html>");
        let outcome = first_found(&[&|_| Extraction::NotFound, &|_| Extraction::NotFound], &doc);
        assert!(!outcome.is_found());
    }

    #[test]
    fn test_identify_requires_serial() {
        let doc = Html::parse_document("<html><body><h1 class=\"long-title\">Named</h1></body></html>");
        let profile = ScrapeProfile::default();
        // Name scrapes fine but nothing carries an identifier.
        assert!(matches!(
            identify(&doc, "some/path", &profile),
            Err(ExtractError::MissingIdentifier)
        ));
    }
}
