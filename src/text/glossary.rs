//! Placeholder-glossary substitution for machine-translated chapter text.
//!
//! Translated chapter bodies carry reserved placeholder tokens where the
//! translation pipeline deferred a term to a side-channel glossary. A token
//! wraps a non-negative index in a pair of delimiter characters chosen to be
//! vanishingly unlikely in natural prose.

use regex::{NoExpand, Regex};
use serde_json::Value;

use crate::extract::ExtractError;

/// Left delimiter of a placeholder token.
const LEFT_DELIMITER: char = '※';

/// Right delimiter of a placeholder token.
const RIGHT_DELIMITER: char = '⛬';

/// A glossary entry: placeholder index and the text it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryTerm {
    /// Index embedded in the placeholder token
    pub index: usize,

    /// Replacement text
    pub replacement: String,
}

impl GlossaryTerm {
    /// Create a term.
    pub fn new(index: usize, replacement: impl Into<String>) -> Self {
        Self {
            index,
            replacement: replacement.into(),
        }
    }
}

/// Render the placeholder token for a glossary index.
pub fn placeholder(index: usize) -> String {
    format!("{}{}{}", LEFT_DELIMITER, index, RIGHT_DELIMITER)
}

/// Replace every occurrence of each known placeholder with its term.
///
/// Placeholders whose index has no entry in `terms` are left verbatim.
/// Replacement text never re-introduces the placeholder form, so applying
/// this twice with the same terms is a no-op the second time. The token is
/// escaped before pattern construction so delimiter characters that happen
/// to be pattern-special are matched literally.
pub fn substitute(text: &str, terms: &[GlossaryTerm]) -> String {
    let mut result = text.to_string();

    for term in terms {
        if term.replacement.is_empty() {
            continue;
        }

        let token = placeholder(term.index);
        let Ok(pattern) = Regex::new(&regex::escape(&token)) else {
            continue;
        };
        if pattern.is_match(&result) {
            // NoExpand: replacement text is literal, never a capture template.
            result = pattern
                .replace_all(&result, NoExpand(term.replacement.as_str()))
                .into_owned();
        }
    }

    result
}

/// Decode the side-channel glossary term list.
///
/// Each raw entry is a tuple of `[translations, original]` where
/// `translations` is either a single string or an array of candidates; the
/// first candidate wins. Entries with no usable translation are skipped.
/// Indices are positional: the placeholder for entry *i* is `※i⛬`.
pub fn parse_terms(raw_terms: &[Value]) -> Result<Vec<GlossaryTerm>, ExtractError> {
    let mut terms = Vec::with_capacity(raw_terms.len());

    for (index, entry) in raw_terms.iter().enumerate() {
        let translation = match entry.get(0) {
            Some(Value::Array(candidates)) => candidates.first().and_then(Value::as_str),
            Some(Value::String(single)) => Some(single.as_str()),
            _ => None,
        };

        match translation {
            Some(text) if !text.trim().is_empty() => {
                terms.push(GlossaryTerm::new(index, text.trim()));
            }
            _ => {
                tracing::debug!("glossary entry {} has no usable translation, skipping", index);
            }
        }
    }

    if terms.is_empty() {
        return Err(ExtractError::Glossary(
            "glossary payload contained no usable terms".to_string(),
        ));
    }

    Ok(terms)
}
