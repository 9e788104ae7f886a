//! The overall assembly workflow.
//!
//! One call walks a fetched novel document through identification, chapter
//! aggregation, and (when aggregation fails fast) the direct document
//! scrape fallback:
//!
//! ```text
//! identify ──id──> aggregate ──ok──> done
//!     │                │
//!     │                └─fail-fast─> scrape document listing ──> done
//!     └─no id──> MissingIdentifier (terminal)
//! ```
//!
//! An optional, purely advisory identifier cache can rescue documents whose
//! channels stopped exposing the identifier; dropping it at any time only
//! costs re-extraction, never correctness.

use scraper::Html;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::extract::{self, markup, ExtractError, Extraction, ScrapeProfile};
use crate::models::{Novel, SerialId};
use crate::paginate::{self, AggregateOptions, CancelFlag, ChapterFeed};

/// Advisory cache mapping a novel path to its previously resolved
/// identifier. Injected explicitly by the caller; never a hidden global.
pub trait IdCache: Send + Sync {
    /// Look up the identifier previously resolved for a path.
    fn get(&self, path: &str) -> Option<SerialId>;

    /// Record a freshly resolved identifier.
    fn put(&self, serial: &SerialId);
}

/// Process-local, in-memory [`IdCache`].
#[derive(Debug, Default)]
pub struct MemoryIdCache {
    entries: Mutex<HashMap<String, SerialId>>,
}

impl MemoryIdCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdCache for MemoryIdCache {
    fn get(&self, path: &str) -> Option<SerialId> {
        self.entries.lock().ok()?.get(path).cloned()
    }

    fn put(&self, serial: &SerialId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(serial.path.clone(), serial.clone());
        }
    }
}

/// Assembly tunables.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Aggregation policy and window size
    pub aggregate: AggregateOptions,

    /// Selector chains for the markup channel
    pub profile: ScrapeProfile,
}

/// An assembled record plus how it was arrived at.
#[derive(Debug)]
pub struct Assembly {
    /// The assembled record
    pub novel: Novel,

    /// False when cancellation or skipped pages left the listing partial
    pub complete: bool,

    /// True when the chapter listing came from the document scrape fallback
    pub fallback_scrape: bool,

    /// Pages or window starts skipped under the best-effort policy
    pub skipped: Vec<u32>,
}

/// Assemble a novel record from one fetched document.
///
/// Extraction strategies run in priority order; the resolved identifier
/// (or a cached one, when every channel stopped exposing it) drives
/// chapter aggregation over `feed`. An aggregation failure under the
/// fail-fast policy falls back to scraping the chapter listing out of the
/// document itself. Without any identifier the record is not assembled:
/// [`ExtractError::MissingIdentifier`] is terminal.
pub async fn assemble(
    document: &str,
    path: &str,
    feed: &dyn ChapterFeed,
    cache: Option<&dyn IdCache>,
    options: &AssembleOptions,
    cancel: &CancelFlag,
) -> Result<Assembly, ExtractError> {
    let doc = Html::parse_document(document);

    let (mut novel, serial) = match extract::extract_novel(&doc, path, &options.profile) {
        Extraction::Found { novel, serial } => (novel, serial),
        Extraction::NotFound => (Novel::new(path, ""), None),
    };

    let serial = match serial {
        Some(serial) => {
            if let Some(cache) = cache {
                cache.put(&serial);
            }
            serial
        }
        None => match cache.and_then(|cache| cache.get(path)) {
            Some(cached) => {
                tracing::debug!("no channel exposed an identifier for {}, using cached one", path);
                cached
            }
            None => return Err(ExtractError::MissingIdentifier),
        },
    };

    match paginate::aggregate(feed, &serial, &options.aggregate, cancel).await {
        Ok(harvest) => {
            novel.chapters = harvest.chapters;
            Ok(Assembly {
                novel,
                complete: harvest.complete,
                fallback_scrape: false,
                skipped: harvest.skipped,
            })
        }
        Err(error) => {
            tracing::warn!(
                "chapter aggregation failed for {} ({}), scraping the document listing instead",
                path,
                error
            );
            novel.chapters = markup::scrape_chapters(&doc, &options.profile);
            Ok(Assembly {
                novel,
                complete: true,
                fallback_scrape: true,
                skipped: Vec::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryIdCache::new();
        assert!(cache.get("en/serie-9/azure").is_none());

        let serial = SerialId::new("9", "en/serie-9/azure").with_total(42);
        cache.put(&serial);

        let cached = cache.get("en/serie-9/azure").unwrap();
        assert_eq!(cached.id, "9");
        assert_eq!(cached.total_chapters, Some(42));
    }

    #[test]
    fn test_memory_cache_overwrites() {
        let cache = MemoryIdCache::new();
        cache.put(&SerialId::new("1", "p"));
        cache.put(&SerialId::new("2", "p"));
        assert_eq!(cache.get("p").unwrap().id, "2");
    }
}
