//! Selector-based extraction from rendered markup, the last-resort channel.
//!
//! Every field resolves through an ordered chain of selector candidates;
//! the first candidate that produces non-empty text wins and the rest are
//! never evaluated. The candidate chains are grouped in a [`ScrapeProfile`]
//! so callers can override them for site variants; the defaults cover the
//! observed site family.

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::Extraction;
use crate::models::{Chapter, NovelBuilder, NovelStatus, SerialId};
use crate::text::time::normalize_relative;
use crate::utils::dedup_by_key;

/// Selector candidate chains for every scraped field.
#[derive(Debug, Clone)]
pub struct ScrapeProfile {
    /// Novel title
    pub name: Vec<String>,
    /// Author
    pub author: Vec<String>,
    /// Cover image element (the `src` attribute is taken)
    pub cover: Vec<String>,
    /// Synopsis
    pub summary: Vec<String>,
    /// Genre labels
    pub genres: Vec<String>,
    /// Tag labels, merged into the genre set
    pub tags: Vec<String>,
    /// Status text
    pub status: Vec<String>,
    /// Elements whose text may advertise the total chapter count
    pub chapter_count: Vec<String>,
    /// Chapter link elements in the listing section
    pub chapter_items: Vec<String>,
    /// Chapter title, scoped to a chapter item
    pub chapter_name: Vec<String>,
    /// Chapter release date text, scoped to a chapter item
    pub chapter_date: Vec<String>,
    /// Catalog/search listing cards
    pub catalog_items: Vec<String>,
    /// Novel title, scoped to a catalog card
    pub catalog_name: Vec<String>,
    /// Nested elements whose text is stripped from the catalog title
    pub catalog_strip: Vec<String>,
    /// Chapter body container
    pub content: Vec<String>,
}

fn chain(candidates: &[&str]) -> Vec<String> {
    candidates.iter().map(|s| s.to_string()).collect()
}

impl Default for ScrapeProfile {
    fn default() -> Self {
        Self {
            name: chain(&[
                "div.novel-title > h1",
                "h1.text-uppercase",
                "h1.long-title",
                ".title-wrap h1",
            ]),
            author: chain(&["div.novel-author > content", ".author-wrap a", "td.author-cell + td"]),
            cover: chain(&["div.novel-img > img", ".image-wrap img", ".img-wrap > img"]),
            summary: chain(&["#synopsis > div.content", ".desc-wrap .description", ".description", ".lead"]),
            genres: chain(&["div.genres > .items > span", ".genres .genre", ".genre"]),
            tags: chain(&["div.tags > .items > a", ".tags .tag", ".tag"]),
            status: chain(&["div.novel-status > div.content", ".status-cell", ".detail-line .status"]),
            chapter_count: chain(&[".detail-line", ".chapter-count"]),
            chapter_items: chain(&[
                "div.chapters > div.list-wrapper > div.items > a.chapter",
                ".chapter-list a.chapter-item",
            ]),
            chapter_name: chain(&["span.chapter-title", ".chapter-title"]),
            chapter_date: chain(&["span.update-date", ".update-date"]),
            catalog_items: chain(&["div.novel-card", ".serie-item"]),
            catalog_name: chain(&["a > div.title > h1", ".title-wrap > a"]),
            catalog_strip: chain(&[".rawtitle"]),
            content: chain(&["div.chapter-content", ".chapter-body"]),
        }
    }
}

/// First candidate whose first match yields non-empty text.
pub(crate) fn first_text(doc: &Html, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        let selector = Selector::parse(candidate).ok()?;
        doc.select(&selector).find_map(non_empty_text)
    })
}

/// First candidate whose first match carries a non-empty attribute.
pub(crate) fn first_attr(doc: &Html, candidates: &[String], attr: &str) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        let selector = Selector::parse(candidate).ok()?;
        doc.select(&selector).find_map(|el| {
            let value = el.value().attr(attr)?.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

/// All non-empty texts of the first candidate that produces any.
fn texts(doc: &Html, candidates: &[String]) -> Vec<String> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let found: Vec<String> = doc.select(&selector).filter_map(non_empty_text).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Matches of the first candidate that has any.
pub(crate) fn select_items<'a>(doc: &'a Html, candidates: &[String]) -> Vec<ElementRef<'a>> {
    for candidate in candidates {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        let found: Vec<ElementRef<'a>> = doc.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Element-scoped variant of [`first_text`].
pub(crate) fn child_text(el: ElementRef<'_>, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        let selector = Selector::parse(candidate).ok()?;
        el.select(&selector).find_map(non_empty_text)
    })
}

fn non_empty_text(el: ElementRef<'_>) -> Option<String> {
    let text: String = el.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Run the markup strategy over a parsed novel document.
///
/// Produces the record from selector chains and, when the record path
/// embeds one, the backend identifier; the advertised chapter count rides
/// along for window pagination.
pub fn scrape_novel(doc: &Html, path: &str, profile: &ScrapeProfile) -> Extraction {
    let name = first_text(doc, &profile.name).unwrap_or_default();
    let serial = serial_from_document(doc, path, profile);

    if name.is_empty() && serial.is_none() {
        return Extraction::NotFound;
    }

    let mut builder = NovelBuilder::new(path, name);

    if let Some(author) = first_text(doc, &profile.author) {
        builder = builder.author(author);
    }
    if let Some(cover) = first_attr(doc, &profile.cover, "src") {
        builder = builder.cover(cover);
    }
    if let Some(summary) = first_text(doc, &profile.summary) {
        builder = builder.summary(summary);
    }
    if let Some(status) = first_text(doc, &profile.status) {
        builder = builder.status(NovelStatus::from_text(&status));
    }

    let genres = texts(doc, &profile.genres)
        .into_iter()
        .chain(texts(doc, &profile.tags))
        .map(|label| label.trim_end_matches(',').trim().to_string());
    builder = builder.genres(genres);

    Extraction::Found {
        novel: builder.build(),
        serial,
    }
}

/// Recover the backend identifier embedded in the record path, plus the
/// advertised total chapter count when the document carries one.
pub fn serial_from_document(doc: &Html, path: &str, profile: &ScrapeProfile) -> Option<SerialId> {
    let id_pattern = Regex::new(r"serie-(\d+)").ok()?;
    let id = id_pattern.captures(path)?.get(1)?.as_str().to_string();

    let mut serial = SerialId::new(id, path);
    serial.total_chapters = advertised_count(doc, profile);
    Some(serial)
}

fn advertised_count(doc: &Html, profile: &ScrapeProfile) -> Option<usize> {
    let count_pattern = Regex::new(r"(?i)(\d+)\s+chapters?").ok()?;
    for candidate in &profile.chapter_count {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for el in doc.select(&selector) {
            let text: String = el.text().collect();
            if let Some(captures) = count_pattern.captures(&text) {
                return captures.get(1)?.as_str().parse().ok();
            }
        }
    }
    None
}

/// Scrape the chapter listing directly from the novel document.
///
/// The fallback channel when aggregation over the backend listing endpoints
/// is impossible or failed. Release dates on these listings are relative
/// ("3 days ago") and are normalized against the current instant; entries
/// without a link are dropped, duplicate paths keep their first occurrence.
pub fn scrape_chapters(doc: &Html, profile: &ScrapeProfile) -> Vec<Chapter> {
    let now = Utc::now();
    let link = Selector::parse("a").expect("static selector");

    let chapters: Vec<Chapter> = select_items(doc, &profile.chapter_items)
        .into_iter()
        .filter_map(|item| {
            let href = item
                .value()
                .attr("href")
                .or_else(|| item.select(&link).next().and_then(|a| a.value().attr("href")))?;
            let path = href.trim_matches('/').to_string();
            if path.is_empty() {
                return None;
            }

            let name = child_text(item, &profile.chapter_name)
                .or_else(|| non_empty_text(item))
                .unwrap_or_default();
            let release_time =
                child_text(item, &profile.chapter_date).and_then(|text| normalize_relative(now, &text));

            Some(Chapter {
                name,
                path,
                release_time,
                chapter_number: None,
            })
        })
        .collect();

    dedup_by_key(chapters, |chapter| chapter.path.clone())
}
