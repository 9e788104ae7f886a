//! Extraction of catalog and search listing documents.

use scraper::{Html, Selector};

use crate::extract::markup::{child_text, select_items, ScrapeProfile};
use crate::models::NovelSummary;
use crate::utils::dedup_by_key;

/// Parse a catalog or search listing document into novel summaries.
///
/// Cards missing a name or a link are dropped; duplicate paths keep their
/// first occurrence in listing order.
pub fn extract_catalog(doc: &Html, profile: &ScrapeProfile) -> Vec<NovelSummary> {
    let link = Selector::parse("a").expect("static selector");
    let image = Selector::parse("img").expect("static selector");

    let summaries: Vec<NovelSummary> = select_items(doc, &profile.catalog_items)
        .into_iter()
        .filter_map(|card| {
            let mut name = child_text(card, &profile.catalog_name)?;

            // Some cards nest the untranslated title inside the link text;
            // strip it so only the display title remains.
            if let Some(raw_title) = child_text(card, &profile.catalog_strip) {
                name = name.replace(&raw_title, "").trim().to_string();
            }
            if name.is_empty() {
                return None;
            }

            let href = card
                .select(&link)
                .find_map(|a| a.value().attr("href"))?;
            let path = href.trim_matches('/').to_string();
            if path.is_empty() {
                return None;
            }

            let cover = card
                .select(&image)
                .find_map(|img| img.value().attr("src"))
                .map(|src| src.to_string());

            Some(NovelSummary { name, cover, path })
        })
        .collect();

    dedup_by_key(summaries, |summary| summary.path.clone())
}
