//! # novelgrab
//!
//! Extraction core for web-novel catalog sites that expose the same record
//! through several unreliable channels: an embedded client-hydration data
//! blob, a private JSON API, and rendered markup.
//!
//! The crate is a pure function of the documents and responses handed to
//! it. Fetching is abstracted behind the [`paginate::ChapterFeed`] trait;
//! a reqwest-backed adapter for the supported site family ships in
//! [`fetch`], and an in-memory feed is all tests need.
//!
//! ## Architecture
//!
//! - [`models`]: novel, chapter, and listing records
//! - [`extract`]: the ordered multi-channel extraction strategies
//! - [`paginate`]: paged/windowed chapter aggregation with explicit
//!   termination bounds and failure policy
//! - [`text`]: relative-time normalization and glossary substitution
//! - [`pipeline`]: the identify → aggregate → fallback workflow
//! - [`fetch`]: reqwest transport adapter
//! - [`utils`]: deduplication, HTTP client, retry
//!
//! ## Example
//!
//! ```rust,no_run
//! use novelgrab::paginate::CancelFlag;
//! use novelgrab::pipeline::{assemble, AssembleOptions};
//! use novelgrab::fetch::ApiFeed;
//!
//! # async fn example(document: &str) -> Result<(), novelgrab::ExtractError> {
//! let feed = ApiFeed::new(url::Url::parse("https://example.com").unwrap());
//! let assembly = assemble(
//!     document,
//!     "en/serie-77/azure-peak",
//!     &feed,
//!     None,
//!     &AssembleOptions::default(),
//!     &CancelFlag::new(),
//! )
//! .await?;
//! println!("{} chapters", assembly.novel.chapters.len());
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod fetch;
pub mod models;
pub mod paginate;
pub mod pipeline;
pub mod text;
pub mod utils;

// Re-export commonly used types
pub use extract::{ExtractError, Extraction, ScrapeProfile};
pub use models::{Chapter, Novel, NovelBuilder, NovelStatus, NovelSummary, SerialId};
pub use paginate::{AggregateOptions, CancelFlag, ChapterFeed, FailurePolicy, Harvest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
