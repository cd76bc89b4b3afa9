//! Recovery of a JSON order object from free model text.
//!
//! Strategies are tried in a fixed order and the first one that yields a
//! parseable JSON object wins:
//!
//! 1. [`Strategy::Fenced`]: the body of a fenced code block, optionally
//!    tagged `json`. A fenced body that does not parse narrows the text the
//!    later strategies look at to that body.
//! 2. [`Strategy::WholeText`]: the text itself.
//! 3. [`Strategy::BraceScan`]: last resort. Everything from the first `{` to
//!    the last `}`. Unrelated braces around the object make this fail, and
//!    that failure is final.
//!
//! Only objects are accepted; a bare number or array is not an order.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::Order;

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(\{.*\})\s*```").expect("Invalid fence regex")
});

/// How an order object was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fenced,
    WholeText,
    BraceScan,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Fenced => write!(f, "fenced"),
            Strategy::WholeText => write!(f, "whole_text"),
            Strategy::BraceScan => write!(f, "brace_scan"),
        }
    }
}

fn is_json_object(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate)
        .map(|value| value.is_object())
        .unwrap_or(false)
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

/// Find a JSON object in `text` and report which strategy found it.
pub fn extract_with_strategy(text: &str) -> Option<(String, Strategy)> {
    if text.is_empty() {
        return None;
    }

    let mut haystack = text;
    if let Some(body) = FENCED_OBJECT.captures(text).and_then(|c| c.get(1)) {
        let candidate = body.as_str().trim();
        if is_json_object(candidate) {
            return Some((candidate.to_string(), Strategy::Fenced));
        }
        haystack = candidate;
    }

    if is_json_object(haystack) {
        return Some((haystack.to_string(), Strategy::WholeText));
    }
    // Valid JSON of another shape is never scanned into.
    if is_json(haystack) {
        return None;
    }

    let first = haystack.find('{')?;
    let last = haystack.rfind('}')?;
    if last > first {
        let candidate = &haystack[first..=last];
        if is_json_object(candidate) {
            return Some((candidate.to_string(), Strategy::BraceScan));
        }
    }
    None
}

/// Find a JSON object in `text`. Returns `None` when there is none.
pub fn extract(text: &str) -> Option<String> {
    match extract_with_strategy(text) {
        Some((json, strategy)) => {
            debug!(strategy = %strategy, chars = json.len(), "Order JSON extracted");
            Some(json)
        }
        None => {
            debug!(chars = text.len(), "No order JSON in text");
            None
        }
    }
}

/// Extract and decode an order from model text.
///
/// Fails with [`PizzeriaError::Parse`] carrying the raw text when no object
/// can be found.
pub fn parse_order(text: &str) -> Result<Order> {
    let json = extract(text).ok_or_else(|| {
        PizzeriaError::Parse(format!("no order JSON found in model reply: {}", text))
    })?;
    let order: Order = serde_json::from_str(&json)?;
    Ok(order)
}
