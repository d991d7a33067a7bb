//! In-memory substring search over the article corpus.
//!
//! The index is a flat list of entries, one per article, in store order.
//! Queries do not rank: results come back in index order.

use crate::models::ContentRecord;
use serde::{Deserialize, Serialize};

/// Terms shorter than this (after trimming) match nothing
pub const MIN_QUERY_CHARS: usize = 2;
/// Context kept before the first body match
pub const SNIPPET_CHARS_BEFORE: usize = 40;
/// Context kept after the end of the first body match
pub const SNIPPET_CHARS_AFTER: usize = 60;
/// Body prefix used as a snippet when the body itself did not match
pub const FALLBACK_SNIPPET_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub id: String,
    pub title: String,
    /// Markdown body, front matter removed
    pub content: String,
    pub category: String,
    pub description: String,
}

impl From<&ContentRecord> for SearchEntry {
    fn from(record: &ContentRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            content: record.raw_body.clone(),
            category: record.category.clone(),
            description: record.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub category: String,
}

/// Serializes as the bare entry array, so it doubles as the corpus payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn build(records: &[ContentRecord]) -> Self {
        Self {
            entries: records.iter().map(SearchEntry::from).collect(),
        }
    }

    pub fn from_entries(entries: Vec<SearchEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over title, description and body.
    pub fn query(&self, term: &str) -> Vec<SearchResult> {
        // Only the length check ignores surrounding whitespace; a term like
        // "rust " still has to match its trailing space.
        if term.trim().chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let needle = fold(term);

        let results: Vec<SearchResult> = self
            .entries
            .iter()
            .filter_map(|entry| match_entry(entry, &needle))
            .collect();

        tracing::debug!("Query {:?} matched {} of {} entries", term, results.len(), self.len());
        results
    }
}

fn match_entry(entry: &SearchEntry, needle: &[char]) -> Option<SearchResult> {
    let body: Vec<char> = entry.content.chars().collect();

    let snippet = match find_folded(&body, needle) {
        Some(at) => body_snippet(&body, at, needle.len()),
        None if contains_folded(&entry.title, needle)
            || contains_folded(&entry.description, needle) =>
        {
            fallback_snippet(entry, &body)
        }
        None => return None,
    };

    Some(SearchResult {
        id: entry.id.clone(),
        title: entry.title.clone(),
        snippet,
        category: entry.category.clone(),
    })
}

/// Window around the first match, in chars, clamped to the body
fn body_snippet(body: &[char], at: usize, len: usize) -> String {
    let start = at.saturating_sub(SNIPPET_CHARS_BEFORE);
    let end = (at + len + SNIPPET_CHARS_AFTER).min(body.len());

    let window = flatten(&body[start..end]);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(window.trim());
    if end < body.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

fn fallback_snippet(entry: &SearchEntry, body: &[char]) -> String {
    if !entry.description.is_empty() {
        return entry.description.clone();
    }
    let prefix = &body[..body.len().min(FALLBACK_SNIPPET_CHARS)];
    let mut snippet = flatten(prefix).trim().to_string();
    snippet.push_str(ELLIPSIS);
    snippet
}

/// Line breaks become spaces so a snippet reads as one line
fn flatten(chars: &[char]) -> String {
    chars
        .iter()
        .map(|&c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Per-char lowercase. Keeps a 1:1 char mapping with the source text so
/// match positions index the original.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn fold(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

fn find_folded(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| {
        window
            .iter()
            .zip(needle)
            .all(|(&h, &n)| fold_char(h) == n)
    })
}

fn contains_folded(text: &str, needle: &[char]) -> bool {
    let chars: Vec<char> = text.chars().collect();
    find_folded(&chars, needle).is_some()
}
