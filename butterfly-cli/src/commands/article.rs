//! Render a single article in structured form.

use super::load_site;
use crate::ArticleFormat;
use anyhow::{Context, Result};
use std::path::Path;

/// Render an article. A missing id is an error, so the process exits non-zero.
pub fn show_article(config_path: &Path, id: &str, format: ArticleFormat) -> Result<()> {
    let site = load_site(config_path)?;

    let article = site
        .article(id)
        .with_context(|| format!("Article '{}' could not be loaded", id))?;

    match format {
        ArticleFormat::Json => println!("{}", serde_json::to_string_pretty(&article)?),
        ArticleFormat::Html => println!("{}", article.content_html),
    }

    Ok(())
}
