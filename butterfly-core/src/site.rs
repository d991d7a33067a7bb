//! Site facade: one entry point for the list, article, search and image
//! boundaries.
//!
//! Every call reads the content directory again; the render cache is the
//! only state kept between calls.

use crate::assets::{AssetError, AssetResolver, ResolvedAsset};
use crate::cache::RenderCache;
use crate::config::Config;
use crate::markdown::theme_css;
use crate::meta::{collect_categories, read_time_minutes, sort_newest_first};
use crate::models::{ArticleListing, ArticleMeta, RenderedArticle};
use crate::search::{SearchIndex, SearchResult};
use crate::store::{ContentStore, StoreError};

#[derive(Debug)]
pub struct Site {
    config: Config,
    store: ContentStore,
    renderer: RenderCache,
    assets: AssetResolver,
}

impl Site {
    pub fn new(config: Config) -> Self {
        let store = ContentStore::new(config.content_dir(), &config.content_extension);
        let renderer = RenderCache::new(config.render.cache_capacity);
        let assets = AssetResolver::new(config.images_dir());

        tracing::debug!(
            "Site ready: content={:?} images={:?}",
            store.root(),
            assets.root()
        );

        Self {
            config,
            store,
            renderer,
            assets,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All articles, newest first, with the categories they use
    pub fn list_articles(&self) -> ArticleListing {
        let records = self.store.list();

        let mut articles: Vec<ArticleMeta> = records
            .iter()
            .map(|record| ArticleMeta::from_record(record, read_time_minutes(&record.raw_body)))
            .collect();
        sort_newest_first(&mut articles, |meta| meta.date.as_str());

        let categories = collect_categories(articles.iter().map(|meta| meta.category.as_str()));

        tracing::info!(
            "Listed {} articles in {} categories",
            articles.len(),
            categories.len()
        );
        ArticleListing {
            articles,
            categories,
        }
    }

    /// Render one article. A missing id is `StoreError::NotFound`.
    pub fn article(&self, id: &str) -> Result<RenderedArticle, StoreError> {
        let record = self.store.load(id)?;
        let read_time = read_time_minutes(&record.raw_body);
        let content_html = self.renderer.render(&record.raw_body);

        Ok(RenderedArticle {
            id: record.id,
            title: record.title,
            date: record.date,
            category: record.category,
            description: record.description,
            content_html,
            read_time_minutes: read_time.minutes(),
            read_time: read_time.to_string(),
        })
    }

    /// Fresh index over the current content, in store order
    pub fn search_index(&self) -> SearchIndex {
        SearchIndex::build(&self.store.list())
    }

    pub fn search(&self, term: &str) -> Vec<SearchResult> {
        self.search_index().query(term)
    }

    pub fn resolve_asset(&self, path: &str) -> Result<ResolvedAsset, AssetError> {
        self.assets.resolve(path)
    }

    /// Stylesheet for the configured highlight theme
    pub fn highlight_css(&self) -> Option<String> {
        theme_css(&self.config.render.highlight_theme)
    }
}
