//! Novel and chapter models shared by every extraction channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Publication status of a serial, as advertised by the remote site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NovelStatus {
    #[default]
    Unknown,
    Ongoing,
    Completed,
    Hiatus,
    Dropped,
}

impl NovelStatus {
    /// Classify free status text scraped from markup.
    pub fn from_text(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.contains("ongoing") {
            NovelStatus::Ongoing
        } else if lower.contains("complete") {
            NovelStatus::Completed
        } else if lower.contains("hiatus") || lower.contains("on hold") {
            NovelStatus::Hiatus
        } else if lower.contains("dropped") || lower.contains("cancel") {
            NovelStatus::Dropped
        } else {
            NovelStatus::Unknown
        }
    }

    /// Classify the numeric status code carried by hydration payloads.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => NovelStatus::Ongoing,
            1 => NovelStatus::Completed,
            _ => NovelStatus::Unknown,
        }
    }
}

impl std::fmt::Display for NovelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NovelStatus::Unknown => "Unknown",
            NovelStatus::Ongoing => "Ongoing",
            NovelStatus::Completed => "Completed",
            NovelStatus::Hiatus => "Hiatus",
            NovelStatus::Dropped => "Dropped",
        };
        write!(f, "{}", name)
    }
}

/// One chapter entry in a novel's listing.
///
/// `path` is unique within a novel. `chapter_number` is the site-assigned
/// ordinal when the listing channel exposes one; listings where every
/// chapter carries a number sort ascending by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Display name of the chapter
    pub name: String,

    /// Site-relative path, unique within the novel
    pub path: String,

    /// Absolute release timestamp, when known
    pub release_time: Option<DateTime<Utc>>,

    /// Non-negative ordinal assigned by the site, when known
    pub chapter_number: Option<u32>,
}

impl Chapter {
    /// Create a chapter with just a name and path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            release_time: None,
            chapter_number: None,
        }
    }
}

/// A novel record assembled from one extraction call.
///
/// Created per call and owned by the caller; nothing in this crate holds on
/// to it or mutates it concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Novel {
    /// Site-relative path, the stable key for this record
    pub path: String,

    /// Title
    pub name: String,

    /// Author, when any channel exposed one
    pub author: Option<String>,

    /// Cover image URL
    pub cover: Option<String>,

    /// Synopsis text
    pub summary: Option<String>,

    /// Genres and tags, deduplicated
    pub genres: BTreeSet<String>,

    /// Publication status
    pub status: NovelStatus,

    /// Ordered chapter listing
    pub chapters: Vec<Chapter>,
}

impl Novel {
    /// Create a new novel with required fields.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            author: None,
            cover: None,
            summary: None,
            genres: BTreeSet::new(),
            status: NovelStatus::Unknown,
            chapters: Vec::new(),
        }
    }
}

/// Builder for constructing [`Novel`] records.
#[derive(Debug, Clone)]
pub struct NovelBuilder {
    novel: Novel,
}

impl NovelBuilder {
    /// Create a new builder with required fields.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            novel: Novel::new(path, name),
        }
    }

    /// Set the author. Empty strings are ignored.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if !author.trim().is_empty() {
            self.novel.author = Some(author);
        }
        self
    }

    /// Set the cover URL. Empty strings are ignored.
    pub fn cover(mut self, cover: impl Into<String>) -> Self {
        let cover = cover.into();
        if !cover.trim().is_empty() {
            self.novel.cover = Some(cover);
        }
        self
    }

    /// Set the summary. Empty strings are ignored.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        if !summary.trim().is_empty() {
            self.novel.summary = Some(summary);
        }
        self
    }

    /// Add a genre or tag. Empty strings are ignored; duplicates collapse.
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        let genre = genre.into();
        let genre = genre.trim();
        if !genre.is_empty() {
            self.novel.genres.insert(genre.to_string());
        }
        self
    }

    /// Add several genres at once.
    pub fn genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for genre in genres {
            self = self.genre(genre);
        }
        self
    }

    /// Set the publication status.
    pub fn status(mut self, status: NovelStatus) -> Self {
        self.novel.status = status;
        self
    }

    /// Set the chapter listing.
    pub fn chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.novel.chapters = chapters;
        self
    }

    /// Build the novel.
    pub fn build(self) -> Novel {
        self.novel
    }
}

/// One entry of a catalog or search listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelSummary {
    /// Title
    pub name: String,

    /// Cover image URL
    pub cover: Option<String>,

    /// Site-relative path, the stable key
    pub path: String,
}

/// Resolved content identifier for a serial, as required by the listing
/// and reader endpoints.
///
/// `path` is the novel path the identifier was resolved for; `total_chapters`
/// rides along when the identifying channel also advertised a count, which
/// enables window pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialId {
    /// Opaque backend identifier
    pub id: String,

    /// Novel path the identifier belongs to
    pub path: String,

    /// Advertised total chapter count, when known
    pub total_chapters: Option<usize>,
}

impl SerialId {
    /// Create an identifier with no known chapter count.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            total_chapters: None,
        }
    }

    /// Attach an advertised total chapter count.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total_chapters = Some(total);
        self
    }
}
