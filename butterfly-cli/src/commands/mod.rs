//! CLI command implementations.

pub mod article;
pub mod list;
pub mod search;
pub mod serve;

pub use article::show_article;
pub use list::list_articles;
pub use search::search_site;
pub use serve::serve;

use anyhow::{Context, Result};
use butterfly_core::{Config, Site};
use std::path::Path;

/// Load configuration (defaults when the file is absent) and open the site
pub fn load_site(config_path: &Path) -> Result<Site> {
    let config = Config::from_file_or_default(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    Ok(Site::new(config))
}
