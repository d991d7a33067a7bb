//! Frontmatter parsing from markdown files.

use crate::models::{DEFAULT_CATEGORY, DEFAULT_TITLE};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Frontmatter metadata from markdown files
///
/// Every key is optional. Scalars of any YAML type are accepted and kept as
/// their string form, so `date: 2024` and `date: "2024"` read the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
}

impl Frontmatter {
    /// Title, or "Untitled" when absent or empty
    pub fn title_or_default(&self) -> String {
        non_empty(&self.title).unwrap_or(DEFAULT_TITLE).to_string()
    }

    /// Category, or "未分类" when absent or empty
    pub fn category_or_default(&self) -> String {
        non_empty(&self.category).unwrap_or(DEFAULT_CATEGORY).to_string()
    }

    pub fn description_or_default(&self) -> String {
        non_empty(&self.description).unwrap_or_default().to_string()
    }

    pub fn date_or_default(&self) -> String {
        non_empty(&self.date).unwrap_or_default().to_string()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^\x{feff}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|$)(.*)$")
            .expect("valid regex")
    })
}

/// Split a file into its raw YAML block (if any) and the body after it
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    match frontmatter_regex().captures(content) {
        Some(captures) => {
            let yaml = captures.get(1).map_or("", |m| m.as_str());
            let body = captures.get(2).map_or("", |m| m.as_str());
            (Some(yaml), body)
        }
        None => (None, content),
    }
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body).
/// If no frontmatter is present, returns default frontmatter with the full content as body.
///
/// # Example
///
/// ```
/// use butterfly_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("My Post"));
/// assert_eq!(fm.date.as_deref(), Some("2025-01-01"));
/// assert!(body.starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let (yaml, body) = split_frontmatter(content);

    let frontmatter = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
        _ => Frontmatter::default(),
    };

    Ok((frontmatter, body.to_string()))
}

/// Like [`parse_frontmatter`], but a broken YAML block falls back to
/// defaults. The block is still removed from the body.
pub fn parse_frontmatter_lenient(content: &str) -> (Frontmatter, String) {
    match parse_frontmatter(content) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Ignoring malformed frontmatter: {}", e);
            let (_, body) = split_frontmatter(content);
            (Frontmatter::default(), body.to_string())
        }
    }
}
