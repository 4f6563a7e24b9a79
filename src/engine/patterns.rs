//! Expect patterns and match results.

use regex::bytes::Regex;
use serde::Serialize;

use crate::error::EngineError;

/// A compiled expect pattern that remembers its source text for reporting.
#[derive(Debug, Clone)]
pub struct ConsolePattern {
    source: String,
    regex: Regex,
}

impl ConsolePattern {
    /// Compile a pattern from its regex source.
    pub fn compile(source: &str) -> Result<Self, EngineError> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// The regex source this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Find the first occurrence in `data`, as `(start, end)` byte offsets.
    pub fn find(&self, data: &[u8]) -> Option<(usize, usize)> {
        self.regex.find(data).map(|m| (m.start(), m.end()))
    }
}

/// Compile a list of pattern sources, preserving order.
pub fn compile_patterns(sources: &[&str]) -> Result<Vec<ConsolePattern>, EngineError> {
    sources.iter().map(|s| ConsolePattern::compile(s)).collect()
}

/// First-pattern-first-match scan: patterns are tried in the order they
/// were supplied, and the first one that matches anywhere wins regardless
/// of where later patterns would have matched.
pub(crate) fn first_match(
    patterns: &[ConsolePattern],
    data: &[u8],
) -> Option<(usize, usize, usize)> {
    for (idx, pattern) in patterns.iter().enumerate() {
        if let Some((start, end)) = pattern.find(data) {
            return Some((idx, start, end));
        }
    }
    None
}

/// Outcome of one `wait_for_match` call.
///
/// `text_received` is everything read since the last drain up to and
/// including the match, or everything seen before timeout/EOF when nothing
/// matched. `text_matched` is only the substring the winning pattern
/// consumed.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Source of the pattern that won, if any.
    pub regex_matched: Option<String>,

    /// The exact text the winning pattern consumed.
    pub text_matched: Option<String>,

    /// All text received up to the match (or timeout/EOF).
    pub text_received: String,
}

impl MatchResult {
    /// Result for a successful match.
    pub(crate) fn matched(pattern: &ConsolePattern, text_matched: String, text_received: String) -> Self {
        Self {
            regex_matched: Some(pattern.source().to_string()),
            text_matched: Some(text_matched),
            text_received,
        }
    }

    /// Result for timeout or end-of-stream.
    pub(crate) fn unmatched(text_received: String) -> Self {
        Self {
            regex_matched: None,
            text_matched: None,
            text_received,
        }
    }

    /// Whether any pattern won.
    pub fn is_match(&self) -> bool {
        self.regex_matched.is_some()
    }
}
