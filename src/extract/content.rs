//! Chapter body extraction.
//!
//! Chapter text arrives through two channels, tried in the same priority
//! order as metadata: the reader API hands back a bare paragraph array,
//! the rendered document carries a content container. Either way, zero
//! extractable content is a typed failure, never an empty success.

use scraper::{Html, Selector};

use crate::extract::markup::{select_items, ScrapeProfile};
use crate::extract::ExtractError;

/// Assemble chapter markup from a reader-API paragraph array.
///
/// Paragraphs are trimmed, empty entries dropped, and the remainder wrapped
/// in `<p>` elements.
pub fn from_paragraphs(paragraphs: &[String]) -> Result<String, ExtractError> {
    let body: String = paragraphs
        .iter()
        .map(|paragraph| paragraph.trim())
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{}</p>", paragraph))
        .collect();

    if body.is_empty() {
        return Err(ExtractError::EmptyContent);
    }
    Ok(body)
}

/// Extract chapter markup from a rendered chapter document.
///
/// Selects the content container and drops paragraph elements that have no
/// text and no element children. A container made only of such paragraphs,
/// or no container at all, is [`ExtractError::EmptyContent`].
pub fn from_markup(doc: &Html, profile: &ScrapeProfile) -> Result<String, ExtractError> {
    let containers = select_items(doc, &profile.content);
    let Some(container) = containers.first() else {
        return Err(ExtractError::EmptyContent);
    };

    let paragraph = Selector::parse("p").expect("static selector");
    let paragraphs: Vec<_> = container.select(&paragraph).collect();

    let body = if paragraphs.is_empty() {
        container.inner_html().trim().to_string()
    } else {
        paragraphs
            .into_iter()
            .filter(|p| {
                let text: String = p.text().collect();
                let has_children = p.children().any(|child| child.value().is_element());
                !text.trim().is_empty() || has_children
            })
            .map(|p| p.html())
            .collect()
    };

    if body.is_empty() {
        return Err(ExtractError::EmptyContent);
    }
    Ok(body)
}
