//! Front-matter extraction.
//!
//! A document may open with a block of `key: value` lines fenced by `---`
//! lines. Parsing is lenient: anything inside the block that is not a
//! `key: value` pair is skipped, and a block that is never closed is treated
//! as ordinary text.

use crate::metadata::{MetaValue, Metadata};

pub const MARKER: &str = "---";

/// split the metadata off the top of a document, returning it and the remaining body
pub fn parse(text: &str) -> (Metadata, &str) {
    match split(text) {
        Some((block, body)) => (parse_block(block), body),
        None => (Metadata::new(), text),
    }
}

/// the raw block between the markers and everything after the closing marker
fn split(text: &str) -> Option<(&str, &str)> {
    let (first, mut rest) = next_line(text)?;
    if !is_marker(first) {
        return None;
    }
    let block_start = text.len() - rest.len();
    loop {
        let line_start = text.len() - rest.len();
        let (line, after) = next_line(rest)?;
        if is_marker(line) {
            return Some((&text[block_start..line_start], after));
        }
        rest = after;
    }
}

fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(i) => Some((&text[..i], &text[i + 1..])),
        None => Some((text, "")),
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

fn parse_block(block: &str) -> Metadata {
    let mut meta = Metadata::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                meta.insert(key.trim(), parse_value(value.trim()));
            }
            _ => log::debug!("Skipping malformed front-matter line `{line}`"),
        }
    }
    meta
}

/// read a value as a yaml scalar, keeping the raw text for anything that isn't a bool or string
fn parse_value(raw: &str) -> MetaValue {
    if raw.is_empty() {
        return MetaValue::Text(String::new());
    }
    match serde_yml::from_str::<serde_yml::Value>(raw) {
        Ok(serde_yml::Value::Bool(b)) => MetaValue::Bool(b),
        Ok(serde_yml::Value::String(s)) => MetaValue::Text(s),
        _ => MetaValue::Text(raw.into()),
    }
}
