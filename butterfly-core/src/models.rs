//! Content model structs for articles, listings and search results.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "未分类";

/// One content file, freshly read from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// File name without extension; doubles as the URL slug
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Date as written in front matter, possibly empty
    pub date: String,
    /// Markdown body with the front matter block removed
    pub raw_body: String,
}

/// Estimated reading time in whole minutes (always at least 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadTime(pub u32);

impl ReadTime {
    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min read", self.0)
    }
}

/// Article page payload handed to the page shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedArticle {
    pub id: String,
    pub title: String,
    pub date: String,
    pub category: String,
    pub description: String,
    pub content_html: String,
    pub read_time_minutes: u32,
    /// Human readable form, e.g. "3 min read"
    pub read_time: String,
}

/// One row of the article list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMeta {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub category: String,
    pub read_time: String,
}

impl ArticleMeta {
    pub fn from_record(record: &ContentRecord, read_time: ReadTime) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            date: record.date.clone(),
            category: record.category.clone(),
            read_time: read_time.to_string(),
        }
    }
}

/// Sorted article list plus the categories that drive the filter UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleListing {
    pub articles: Vec<ArticleMeta>,
    pub categories: Vec<String>,
}

impl ArticleListing {
    /// Articles in one category, keeping list order
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ArticleMeta> {
        self.articles.iter().filter(move |a| a.category == category)
    }
}
