//! List articles newest first.

use super::load_site;
use anyhow::Result;
use butterfly_core::{ArticleListing, ArticleMeta};
use std::path::Path;

pub fn list_articles(config_path: &Path, category: Option<&str>, json: bool) -> Result<()> {
    let site = load_site(config_path)?;
    let mut listing = site.list_articles();

    if let Some(category) = category {
        let articles: Vec<ArticleMeta> = listing.in_category(category).cloned().collect();
        listing = ArticleListing {
            articles,
            categories: listing.categories,
        };
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let info = &site.config().site;
    println!("{}", info.title);
    if !info.description.is_empty() {
        println!("{}", info.description);
    }
    println!();

    if listing.articles.is_empty() {
        println!("No articles found");
        return Ok(());
    }

    for article in &listing.articles {
        let date = if article.date.is_empty() {
            "----------"
        } else {
            article.date.as_str()
        };
        println!(
            "{}  [{}] {} ({})",
            date, article.category, article.title, article.read_time
        );
        println!("    {}", article.id);
        if !article.description.is_empty() {
            println!("    {}", article.description);
        }
    }
    println!("\nCategories: {}", listing.categories.join(", "));

    Ok(())
}
