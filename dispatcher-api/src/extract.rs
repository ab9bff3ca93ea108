//! Pulls a JSON object out of free-form completion text.
//!
//! Models tend to wrap the requested JSON in prose or code fences, and the
//! prose itself may contain braces. Every `{` opens a candidate; the first
//! balanced candidate that deserializes into the requested type is the
//! answer. Braces inside string literals do not count.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in completion")]
    NoObject,

    #[error("completion JSON did not match the expected shape: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Balanced `{...}` block starting at byte `start`, which must hold a `{`.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Every balanced object in `text`, in order of its opening brace.
pub fn json_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_object_at(text, start))
}

/// Slice of `text` holding the first balanced JSON object, if any.
pub fn find_json_object(text: &str) -> Option<&str> {
    json_objects(text).next()
}

/// Parse the first JSON object in `text` that fits `T`.
///
/// Fails with [`ExtractError::NoObject`] when `text` holds no balanced
/// object, otherwise with the parse error of the last candidate tried.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let mut last_error = None;

    for candidate in json_objects(text) {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map_or(ExtractError::NoObject, ExtractError::Invalid))
}
