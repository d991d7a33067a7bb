//! Search command implementation

use super::load_site;
use anyhow::Result;
use butterfly_core::SearchResult;
use std::path::Path;

/// Search the current content and print up to `limit` results
pub fn search_site(config_path: &Path, term: &str, limit: usize, json: bool) -> Result<()> {
    let site = load_site(config_path)?;
    let results = site.search(term);

    if json {
        let shown: Vec<&SearchResult> = results.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found for '{}'", term);
        return Ok(());
    }

    println!("\nFound {} results for '{}':\n", results.len(), term);
    for result in results.iter().take(limit) {
        print_search_result(result);
    }

    if results.len() > limit {
        println!("  ... and {} more results", results.len() - limit);
    }

    Ok(())
}

fn print_search_result(result: &SearchResult) {
    println!("[{}] {}", result.category, result.title);
    println!("  {}", result.id);
    println!("  {}", result.snippet);
    println!();
}
