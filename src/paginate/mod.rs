//! Paginated chapter aggregation.
//!
//! Given a resolved serial identifier, the aggregator drives repeated
//! listing fetches through an injected [`ChapterFeed`] until the chapter
//! set is complete. Two strategies exist, selected by what the backend
//! supports: page-number iteration bounded by the last-page hint each
//! response carries, and window iteration bounded by a known total count
//! with a short-batch sentinel for early end-of-data. Both stop conditions
//! are decidable before the next request is issued, so the loops always
//! terminate.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::extract::ExtractError;
use crate::models::{Chapter, SerialId};
use crate::utils::dedup_by_key;

bitflags::bitflags! {
    /// Pagination strategies a chapter feed supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FeedCapabilities: u32 {
        const PAGED = 1 << 0;
        const WINDOWED = 1 << 1;
    }
}

/// One page of a paged chapter listing.
#[derive(Debug, Default)]
pub struct ChapterPage {
    /// Chapters on this page, in listing order
    pub chapters: Vec<Chapter>,

    /// Last-page hint carried by the response, when present
    pub last_page: Option<u32>,
}

/// Transport collaborator for chapter listings.
///
/// Implementations own the wire format; the aggregator owns iteration,
/// termination, ordering, and failure policy.
#[async_trait]
pub trait ChapterFeed: Send + Sync + std::fmt::Debug {
    /// Which pagination strategies this feed can serve
    fn capabilities(&self) -> FeedCapabilities;

    /// Fetch page `page` (1-based) of the listing
    async fn fetch_page(&self, serial: &SerialId, page: u32) -> Result<ChapterPage, ExtractError>;

    /// Fetch the listing window covering items `start..=end` (1-based)
    async fn fetch_window(
        &self,
        serial: &SerialId,
        start: u32,
        end: u32,
    ) -> Result<Vec<Chapter>, ExtractError>;
}

/// What to do when a single page or window fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort aggregation and propagate the error
    #[default]
    FailFast,
    /// Skip the failed page or window, record it, and continue
    BestEffort,
}

/// Default window size for window pagination.
pub const DEFAULT_WINDOW_SIZE: usize = 250;

/// Aggregation tunables.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Failure policy for individual page/window fetches
    pub policy: FailurePolicy,

    /// Items per window when the window strategy applies
    pub window_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Cooperative cancellation handle, checked between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of one aggregation run.
#[derive(Debug)]
pub struct Harvest {
    /// Collected chapters, ordered and deduplicated
    pub chapters: Vec<Chapter>,

    /// False when cancellation interrupted the run or pages were skipped
    pub complete: bool,

    /// Pages (or window starts) skipped under [`FailurePolicy::BestEffort`]
    pub skipped: Vec<u32>,
}

/// Assemble the complete chapter set for a serial.
///
/// Prefers the window strategy when the feed supports it and the total
/// chapter count is known; falls back to page iteration otherwise. Returns
/// an error when the feed supports no applicable strategy.
pub async fn aggregate(
    feed: &dyn ChapterFeed,
    serial: &SerialId,
    options: &AggregateOptions,
    cancel: &CancelFlag,
) -> Result<Harvest, ExtractError> {
    let capabilities = feed.capabilities();

    if let Some(total) = serial.total_chapters {
        if capabilities.contains(FeedCapabilities::WINDOWED) && total > 0 {
            return by_window(feed, serial, total, options, cancel).await;
        }
    }

    if capabilities.contains(FeedCapabilities::PAGED) {
        return by_page(feed, serial, options, cancel).await;
    }

    Err(ExtractError::Api(
        "feed supports no applicable pagination strategy".to_string(),
    ))
}

/// Page-number iteration: sequential by construction, since the stop bound
/// for page i+1 arrives with page i.
async fn by_page(
    feed: &dyn ChapterFeed,
    serial: &SerialId,
    options: &AggregateOptions,
    cancel: &CancelFlag,
) -> Result<Harvest, ExtractError> {
    let mut chapters = Vec::new();
    let mut skipped = Vec::new();
    let mut cancelled = false;

    let mut page = 1u32;
    let mut last_page = 1u32;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!("aggregation cancelled at page {}", page);
            cancelled = true;
            break;
        }

        match feed.fetch_page(serial, page).await {
            Ok(fetched) => {
                if let Some(hint) = fetched.last_page {
                    last_page = hint;
                }
                chapters.extend(fetched.chapters);
            }
            Err(error) => match options.policy {
                FailurePolicy::FailFast => {
                    return Err(ExtractError::PageFetch {
                        at: page,
                        reason: error.to_string(),
                    });
                }
                FailurePolicy::BestEffort => {
                    tracing::warn!("skipping page {} under best-effort policy: {}", page, error);
                    skipped.push(page);
                }
            },
        }

        page += 1;
        if page > last_page {
            break;
        }
    }

    Ok(harvest(chapters, cancelled, skipped))
}

/// Window iteration: bounds are known up front from the total count, with
/// a short batch acting as an end-of-data sentinel.
async fn by_window(
    feed: &dyn ChapterFeed,
    serial: &SerialId,
    total: usize,
    options: &AggregateOptions,
    cancel: &CancelFlag,
) -> Result<Harvest, ExtractError> {
    let mut chapters = Vec::new();
    let mut skipped = Vec::new();
    let mut cancelled = false;

    let total = total as u32;
    let window = options.window_size.max(1) as u32;
    let mut start = 1u32;

    while start <= total {
        if cancel.is_cancelled() {
            tracing::debug!("aggregation cancelled at window start {}", start);
            cancelled = true;
            break;
        }

        let end = (start + window - 1).min(total);
        let requested = end - start + 1;

        match feed.fetch_window(serial, start, end).await {
            Ok(batch) => {
                let received = batch.len() as u32;
                chapters.extend(batch);

                if received < requested {
                    // Short batch: the backend has no more data, regardless
                    // of how many windows were planned.
                    tracing::debug!(
                        "window {}..={} returned {} of {} items, stopping",
                        start,
                        end,
                        received,
                        requested
                    );
                    break;
                }
            }
            Err(error) => match options.policy {
                FailurePolicy::FailFast => {
                    return Err(ExtractError::PageFetch {
                        at: start,
                        reason: error.to_string(),
                    });
                }
                FailurePolicy::BestEffort => {
                    tracing::warn!(
                        "skipping window {}..={} under best-effort policy: {}",
                        start,
                        end,
                        error
                    );
                    skipped.push(start);
                }
            },
        }

        start += window;
    }

    Ok(harvest(chapters, cancelled, skipped))
}

fn harvest(chapters: Vec<Chapter>, cancelled: bool, skipped: Vec<u32>) -> Harvest {
    let complete = !cancelled && skipped.is_empty();
    Harvest {
        chapters: finalize(chapters),
        complete,
        skipped,
    }
}

/// Deduplicate by path and order the listing.
///
/// Sorting by chapter number only applies when every record carries one;
/// otherwise fetch insertion order is preserved.
fn finalize(chapters: Vec<Chapter>) -> Vec<Chapter> {
    let mut chapters = dedup_by_key(chapters, |chapter| chapter.path.clone());

    if !chapters.is_empty() && chapters.iter().all(|chapter| chapter.chapter_number.is_some()) {
        chapters.sort_by_key(|chapter| chapter.chapter_number.unwrap_or(0));
    }

    chapters
}
