//! Best-effort structured output extraction from free-text model replies.
//!
//! Precedence: fenced ```json block, then the widest bare `{...}` or `[...]`
//! span, then the whole reply. The first candidate that deserializes into
//! the requested type wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use super::LlmError;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```").expect("valid fenced block regex")
});
static BARE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));
static BARE_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let mut last_error = None;

    for candidate in candidates(text) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    Err(LlmError::Parse(match last_error {
        Some(e) => format!("no JSON candidate matched the expected shape: {e}"),
        None => "reply contained no JSON".to_string(),
    }))
}

fn candidates(text: &str) -> Vec<&str> {
    let mut out = Vec::with_capacity(4);
    if let Some(body) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        out.push(body.as_str().trim());
    }
    if let Some(m) = BARE_OBJECT.find(text) {
        out.push(m.as_str());
    }
    if let Some(m) = BARE_ARRAY.find(text) {
        out.push(m.as_str());
    }
    let raw = text.trim();
    if !raw.is_empty() {
        out.push(raw);
    }
    out
}
