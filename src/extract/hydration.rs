//! Extraction from embedded client-hydration data blobs.
//!
//! Both observed site generations serialize page state into a script
//! element for client-side rehydration. The payload comes in two shapes: a
//! flat value array that has to be scanned linearly for the first object
//! exposing the identifying field, and a nested object whose record sits at
//! a fixed property path. A classifying parse decides which shape matched;
//! anything malformed is a strategy failure that silently hands over to
//! selector scraping.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::extract::Extraction;
use crate::models::{NovelBuilder, NovelStatus, SerialId};

/// Script elements that carry a hydration payload, in probe order.
const HYDRATION_SCRIPTS: &[&str] = &["script#__NUXT_DATA__", "script#__NEXT_DATA__"];

/// Property path to the serial record inside the nested payload shape.
const NESTED_RECORD_PATH: &[&str] = &["props", "pageProps", "serie", "serie_data"];

/// The two known hydration payload shapes.
#[derive(Debug)]
enum HydrationShape {
    /// Flat value array; the record is found by linear scan
    FlatArray(Vec<Value>),
    /// Nested object; the record sits at a fixed property path
    Nested(Value),
}

fn classify(value: Value) -> Option<HydrationShape> {
    match value {
        Value::Array(values) => Some(HydrationShape::FlatArray(values)),
        value @ Value::Object(_) => Some(HydrationShape::Nested(value)),
        _ => None,
    }
}

/// Run the hydration strategy over a parsed document.
///
/// Returns `Found` only when the payload carries the backend identifier;
/// a blob without one is useless for aggregation and the whole record
/// falls back to markup scraping.
pub fn from_document(doc: &Html, path: &str) -> Extraction {
    let Some(raw) = script_payload(doc) else {
        return Extraction::NotFound;
    };

    let parsed: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("hydration blob is not valid JSON ({}), falling back", err);
            return Extraction::NotFound;
        }
    };

    let outcome = match classify(parsed) {
        Some(HydrationShape::FlatArray(values)) => from_flat(&values, path),
        Some(HydrationShape::Nested(root)) => from_nested(&root, path),
        None => None,
    };

    match outcome {
        Some(extraction) => extraction,
        None => {
            tracing::debug!("hydration blob lacked an identifier, falling back");
            Extraction::NotFound
        }
    }
}

/// Pull the text of the first hydration script element present.
fn script_payload(doc: &Html) -> Option<String> {
    HYDRATION_SCRIPTS.iter().find_map(|selector| {
        let selector = Selector::parse(selector).ok()?;
        let element = doc.select(&selector).next()?;
        let text: String = element.text().collect();
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}

/// Linear scan of the flat array shape for the first object exposing the
/// identifying field, harvesting whatever metadata rides alongside it.
fn from_flat(values: &[Value], path: &str) -> Option<Extraction> {
    for value in values {
        let Some(record) = value.get("novel") else {
            continue;
        };
        let Some(id) = field_id(record) else {
            continue;
        };

        let status = status_code(record).map(NovelStatus::from_code);
        return Some(build(record, status, path, id, None));
    }
    None
}

/// Resolve the record at the fixed property path of the nested shape.
fn from_nested(root: &Value, path: &str) -> Option<Extraction> {
    let mut record = root;
    for segment in NESTED_RECORD_PATH {
        record = record.get(segment)?;
    }

    let id = field_id(record)?;
    let total = record
        .get("chapter_count")
        .and_then(Value::as_u64)
        .map(|count| count as usize);

    // Metadata fields sit in the inner data object; the status code does not.
    let status = status_code(record).map(NovelStatus::from_code);
    let fields = record.get("data").unwrap_or(record);
    Some(build(fields, status, path, id, total))
}

/// The identifying field, numeric or string, under either observed name.
fn field_id(record: &Value) -> Option<String> {
    for key in ["id", "raw_id"] {
        match record.get(key) {
            Some(Value::Number(id)) => return Some(id.to_string()),
            Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
            _ => {}
        }
    }
    None
}

fn build(
    fields: &Value,
    status: Option<NovelStatus>,
    path: &str,
    id: String,
    total: Option<usize>,
) -> Extraction {
    let mut builder = NovelBuilder::new(path, text_field(fields, &["title", "name"]));

    builder = builder
        .author(text_field(fields, &["author"]))
        .cover(text_field(fields, &["image", "cover"]))
        .summary(text_field(fields, &["description", "summary"]));

    if let Some(status) = status {
        builder = builder.status(status);
    }

    let mut serial = SerialId::new(id, path);
    serial.total_chapters = total;

    Extraction::Found {
        novel: builder.build(),
        serial: Some(serial),
    }
}

fn text_field(record: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| record.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// The status code lives beside the data object in the nested shape.
fn status_code(record: &Value) -> Option<i64> {
    record.get("status").and_then(Value::as_i64)
}
