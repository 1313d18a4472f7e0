//! Regex-based extraction of the tagged regions in a model response.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::types::ParsedAnswer;

static FINAL_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*final-answer\s*>(.*?)<\s*/\s*final-answer\s*>")
        .expect("final-answer pattern is valid")
});

static PAGE_REFERENCES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*page-references\s*>(.*?)<\s*/\s*page-references\s*>")
        .expect("page-references pattern is valid")
});

/// Errors produced while parsing a model response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The response has no final-answer region, or the region is blank.
    #[error("model response does not contain a <final-answer> region")]
    MissingAnswer,
}

/// Parses a raw model response into an answer and its cited pages.
///
/// The two regions are located independently; only the first occurrence of
/// each is used. A missing page-reference region yields an empty list.
///
/// # Errors
///
/// Returns [`ParseError::MissingAnswer`] if there is no non-blank
/// final-answer region.
pub fn parse_response(raw: &str) -> Result<ParsedAnswer, ParseError> {
    let answer = first_region(&FINAL_ANSWER_RE, raw)
        .filter(|content| !content.is_empty())
        .ok_or(ParseError::MissingAnswer)?;

    let (page_references, dropped_tokens) = match first_region(&PAGE_REFERENCES_RE, raw) {
        Some(content) => split_page_references(content),
        None => (Vec::new(), Vec::new()),
    };

    if !dropped_tokens.is_empty() {
        log::debug!("Dropped non-numeric page reference tokens: {dropped_tokens:?}");
    }

    Ok(ParsedAnswer::new(
        answer.to_string(),
        page_references,
        dropped_tokens,
    ))
}

/// Returns the trimmed content of the first match of `re` in `raw`.
fn first_region<'a>(re: &Regex, raw: &'a str) -> Option<&'a str> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Splits a comma-separated reference list into integers and dropped tokens.
fn split_page_references(content: &str) -> (Vec<i64>, Vec<String>) {
    let mut pages = Vec::new();
    let mut dropped = Vec::new();

    for token in content.split(',').map(str::trim) {
        match parse_page_token(token) {
            Some(page) => pages.push(page),
            None if token.is_empty() => {}
            None => dropped.push(token.to_string()),
        }
    }

    (pages, dropped)
}

/// Accepts an optional leading minus followed only by ASCII digits.
fn parse_page_token(token: &str) -> Option<i64> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
