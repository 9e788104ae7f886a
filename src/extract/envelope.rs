//! Classifying decoder for the backend response envelopes.
//!
//! The private API family answers in several distinct shapes. Rather than
//! probing fields speculatively, responses are classified by their marker
//! key first and then decoded into the one matching shape; an unrecognized
//! body is a parse error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::extract::ExtractError;

/// A classified backend response.
#[derive(Debug)]
pub enum Envelope {
    /// Proxy envelope wrapping a paged chapter listing
    Proxy(ProxyEnvelope),
    /// Windowed chapter listing
    Windowed(WindowListing),
    /// Reader payload carrying chapter body paragraphs
    Reader(ReaderPayload),
    /// Side-channel glossary payload
    Glossary(GlossaryPayload),
}

/// Decide which known envelope shape a response matches and decode it.
pub fn classify(value: Value) -> Result<Envelope, ExtractError> {
    let Some(object) = value.as_object() else {
        return Err(ExtractError::Parse("response body is not an object".to_string()));
    };

    if object.contains_key("_success") {
        return Ok(Envelope::Proxy(serde_json::from_value(value)?));
    }
    if object.contains_key("chapters") {
        return Ok(Envelope::Windowed(serde_json::from_value(value)?));
    }
    if object.contains_key("glossaries") {
        return Ok(Envelope::Glossary(serde_json::from_value(value)?));
    }
    if object.contains_key("success") {
        return Ok(Envelope::Reader(serde_json::from_value(value)?));
    }

    Err(ExtractError::Parse(
        "response matched no known envelope shape".to_string(),
    ))
}

/// Proxy envelope: the backend tunnels listing requests through a single
/// POST endpoint and prefixes every field with an underscore.
#[derive(Debug, Deserialize)]
pub struct ProxyEnvelope {
    #[serde(rename = "_success")]
    pub success: bool,

    #[serde(rename = "_data", default)]
    pub data: Vec<ProxyChapter>,

    #[serde(rename = "_extra")]
    pub extra: Option<ProxyExtra>,
}

impl ProxyEnvelope {
    /// The last-page hint, when the envelope carries pagination metadata.
    pub fn last_page(&self) -> Option<u32> {
        self.extra.as_ref()?.pagination.as_ref()?.last
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxyChapter {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyExtra {
    #[serde(rename = "_pagination")]
    pub pagination: Option<ProxyPagination>,
}

#[derive(Debug, Deserialize)]
pub struct ProxyPagination {
    #[serde(rename = "_last")]
    pub last: Option<u32>,
}

/// Windowed listing: a bare array of chapter records under `chapters`.
#[derive(Debug, Deserialize)]
pub struct WindowListing {
    #[serde(default)]
    pub chapters: Vec<WindowChapter>,
}

#[derive(Debug, Deserialize)]
pub struct WindowChapter {
    pub order: u32,
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Reader payload: the chapter body paragraphs sit two levels deep.
#[derive(Debug, Deserialize)]
pub struct ReaderPayload {
    pub success: bool,

    #[serde(default)]
    pub data: Option<ReaderData>,

    #[serde(default)]
    pub error: Option<String>,
}

impl ReaderPayload {
    /// The paragraph array, when the payload carries one.
    pub fn body(&self) -> Option<&[String]> {
        Some(self.data.as_ref()?.data.body.as_slice())
    }
}

#[derive(Debug, Deserialize)]
pub struct ReaderData {
    pub data: ReaderBody,
}

#[derive(Debug, Deserialize)]
pub struct ReaderBody {
    #[serde(default)]
    pub body: Vec<String>,
}

/// Glossary payload: the first glossary's raw term tuples.
#[derive(Debug, Deserialize)]
pub struct GlossaryPayload {
    pub success: bool,

    #[serde(default)]
    pub glossaries: Vec<GlossaryEntry>,
}

impl GlossaryPayload {
    /// The raw term tuples of the first glossary, when present.
    pub fn terms(&self) -> Option<&[Value]> {
        let entry = self.glossaries.first()?;
        Some(entry.data.as_ref()?.terms.as_slice())
    }
}

#[derive(Debug, Deserialize)]
pub struct GlossaryEntry {
    #[serde(default)]
    pub data: Option<GlossaryData>,
}

#[derive(Debug, Deserialize)]
pub struct GlossaryData {
    #[serde(default)]
    pub terms: Vec<Value>,
}

/// Parse the timestamp formats the listing endpoints emit: RFC 3339, or a
/// date-only prefix taken as midnight UTC.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    let date_part = text.get(..10)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0)?, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_proxy() {
        let value = json!({
            "_success": true,
            "_data": [{"title": "Chapter 1", "slug": "ch-1", "created_at": "2024-01-05T12:00:00Z"}],
            "_extra": {"_pagination": {"_last": 3}}
        });

        match classify(value).unwrap() {
            Envelope::Proxy(envelope) => {
                assert!(envelope.success);
                assert_eq!(envelope.data.len(), 1);
                assert_eq!(envelope.last_page(), Some(3));
            }
            other => panic!("expected proxy envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_windowed() {
        let value = json!({
            "chapters": [{"order": 1, "title": "Chapter 1", "updated_at": "2024-01-05T00:00:00Z"}]
        });

        match classify(value).unwrap() {
            Envelope::Windowed(listing) => assert_eq!(listing.chapters[0].order, 1),
            other => panic!("expected windowed listing, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_reader() {
        let value = json!({
            "success": true,
            "data": {"data": {"body": ["First.", "Second."]}}
        });

        match classify(value).unwrap() {
            Envelope::Reader(payload) => {
                assert_eq!(payload.body().unwrap().len(), 2);
            }
            other => panic!("expected reader payload, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_glossary() {
        let value = json!({
            "success": true,
            "glossaries": [{"data": {"terms": [[["Lin Fan"], "林凡"]]}}]
        });

        match classify(value).unwrap() {
            Envelope::Glossary(payload) => {
                assert_eq!(payload.terms().unwrap().len(), 1);
            }
            other => panic!("expected glossary payload, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unknown_shape() {
        assert!(matches!(
            classify(json!({"unexpected": 1})),
            Err(ExtractError::Parse(_))
        ));
        assert!(matches!(classify(json!([1, 2])), Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-05T12:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-05T12:30:00+08:00").is_some());
        assert!(parse_timestamp("2024-01-05 some trailing text").is_some());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
