//! # butterfly-core
//!
//! Core library for the Project Butterfly blog.
//!
//! This crate reads markdown articles with front matter from a content
//! directory, renders them to HTML, derives listing metadata, answers
//! search queries and resolves image requests. [`Site`] ties the pieces
//! together for the CLI and the HTTP server.

pub mod assets;
pub mod cache;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod meta;
pub mod models;
pub mod search;
pub mod site;
pub mod store;

pub use assets::{AssetError, AssetResolver, ResolvedAsset};
pub use cache::RenderCache;
pub use config::Config;
pub use markdown::MarkdownProcessor;
pub use meta::{collect_categories, derive_read_time, read_time_minutes, sort_key};
pub use models::{ArticleListing, ArticleMeta, ContentRecord, ReadTime, RenderedArticle};
pub use search::{SearchEntry, SearchIndex, SearchResult};
pub use site::Site;
pub use store::{ContentStore, StoreError};
