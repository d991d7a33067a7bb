//! HTTP server exposing the article, search and image boundaries.
//!
//! Content is re-read on every request; only rendered HTML is cached.

use super::load_site;
use anyhow::{Context, Result};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use butterfly_core::{assets::CACHE_CONTROL, Site};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    site: Arc<Site>,
}

/// Start the server on the configured host, optionally overriding the port
pub async fn serve(config_path: &Path, port: Option<u16>) -> Result<()> {
    let site = load_site(config_path)?;
    let host = site.config().server.host.clone();
    let port = port.unwrap_or(site.config().server.port);

    let app = router(Arc::new(site));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving on http://{}", addr);
    println!("\nServing at http://{}", addr);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

pub fn router(site: Arc<Site>) -> Router {
    let state = AppState { site };

    Router::new()
        .route("/api/site", get(api_site))
        .route("/api/articles", get(api_articles))
        .route("/api/articles/{id}", get(api_article))
        .route("/api/search-index", get(api_search_index))
        .route("/api/search", get(api_search))
        .route("/content-img/{*path}", get(content_image))
        .route("/highlight.css", get(highlight_css))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run a site operation off the async executor; it reads files.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, Response>
where
    F: FnOnce(&Site) -> T + Send + 'static,
    T: Send + 'static,
{
    let site = state.site.clone();
    tokio::task::spawn_blocking(move || f(&site))
        .await
        .map_err(|err| {
            tracing::error!("Task join error: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        })
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

// ---- API handlers ----

async fn api_site(State(state): State<AppState>) -> Response {
    Json(state.site.config().site.clone()).into_response()
}

#[derive(Deserialize)]
struct ListParams {
    category: Option<String>,
}

async fn api_articles(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let mut listing = match blocking(&state, |site| site.list_articles()).await {
        Ok(listing) => listing,
        Err(resp) => return resp,
    };

    if let Some(category) = params.category.filter(|c| !c.is_empty()) {
        listing.articles.retain(|a| a.category == category);
    }

    Json(listing).into_response()
}

async fn api_article(AxumPath(id): AxumPath<String>, State(state): State<AppState>) -> Response {
    let lookup = id.clone();
    let result = match blocking(&state, move |site| site.article(&lookup)).await {
        Ok(result) => result,
        Err(resp) => return resp,
    };

    match result {
        Ok(article) => Json(article).into_response(),
        Err(err) if err.is_not_found() => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "not_found", "id": id })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to load article {}: {}", id, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load article").into_response()
        }
    }
}

async fn api_search_index(State(state): State<AppState>) -> Response {
    match blocking(&state, |site| site.search_index()).await {
        Ok(index) => Json(index).into_response(),
        Err(resp) => resp,
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

async fn api_search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();
    let mut results = match blocking(&state, move |site| site.search(&query)).await {
        Ok(results) => results,
        Err(resp) => return resp,
    };

    if let Some(limit) = params.limit {
        results.truncate(limit);
    }

    Json(results).into_response()
}

async fn content_image(AxumPath(path): AxumPath<String>, State(state): State<AppState>) -> Response {
    let lookup = path.clone();
    let resolved = match blocking(&state, move |site| site.resolve_asset(&lookup)).await {
        Ok(Ok(asset)) => asset,
        Ok(Err(err)) => {
            tracing::debug!("{}", err);
            return not_found().await;
        }
        Err(resp) => return resp,
    };

    match tokio::fs::read(&resolved.path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, resolved.content_type),
                (header::CACHE_CONTROL, CACHE_CONTROL),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::warn!("Failed to read image {:?}: {}", resolved.path, err);
            not_found().await
        }
    }
}

async fn highlight_css(State(state): State<AppState>) -> Response {
    match blocking(&state, |site| site.highlight_css()).await {
        Ok(Some(css)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
            css,
        )
            .into_response(),
        Ok(None) => not_found().await,
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use butterfly_core::Config;
    use serde_json::Value;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn test_app() -> (TempDir, Router) {
        let dir = tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("img")).unwrap();
        fs::write(
            content.join("first.md"),
            "---\ntitle: First\ndate: 2023-05-01\ncategory: notes\n---\n# First\n\nHello rust world\n",
        )
        .unwrap();
        fs::write(
            content.join("second.md"),
            "---\ntitle: Second\ndate: 2024-01-01\ncategory: life\n---\n```csv\na,b\n1,2\n```\n",
        )
        .unwrap();
        fs::write(content.join("img").join("cat.png"), b"\x89PNG").unwrap();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let config = Config::from_file_or_default(dir.path().join("butterfly.yml")).unwrap();
        (dir, router(Arc::new(Site::new(config))))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Vec<(String, String)>, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_articles_listing() {
        let (_dir, app) = test_app();
        let (status, _, body) = fetch(app, "/api/articles").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["articles"][0]["id"], "second");
        assert_eq!(json["articles"][1]["readTime"], "1 min read");
        assert_eq!(json["categories"], serde_json::json!(["life", "notes"]));
    }

    #[tokio::test]
    async fn test_site_info() {
        let (_dir, app) = test_app();
        let (status, _, body) = fetch(app, "/api/site").await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["title"], "Project Butterfly");
        assert_eq!(json["description"], "");
    }

    #[tokio::test]
    async fn test_articles_category_filter() {
        let (_dir, app) = test_app();
        let (_, _, body) = fetch(app, "/api/articles?category=notes").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["articles"].as_array().unwrap().len(), 1);
        assert_eq!(json["articles"][0]["id"], "first");
    }

    #[tokio::test]
    async fn test_article_and_not_found() {
        let (_dir, app) = test_app();

        let (status, _, body) = fetch(app.clone(), "/api/articles/second").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        let html = json["contentHtml"].as_str().unwrap();
        assert!(html.contains(r#"<table class="csv-table">"#));
        assert_eq!(json["readTimeMinutes"], 1);

        let (status, _, _) = fetch(app, "/api/articles/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_endpoints() {
        let (_dir, app) = test_app();

        let (_, _, body) = fetch(app.clone(), "/api/search?q=RUST").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["id"], "first");
        assert_eq!(json[0]["snippet"], "# First  Hello rust world");

        let (_, _, body) = fetch(app.clone(), "/api/search?q=r").await;
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), serde_json::json!([]));

        let (_, _, body) = fetch(app, "/api/search-index").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["id"], "first");
    }

    #[tokio::test]
    async fn test_content_image_headers() {
        let (_dir, app) = test_app();
        let (status, headers, body) = fetch(app, "/content-img/cat.png").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(header_value(&headers, "content-type"), Some("image/png"));
        assert_eq!(header_value(&headers, "cache-control"), Some(CACHE_CONTROL));
        assert_eq!(body, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_content_image_traversal_is_404() {
        let (_dir, app) = test_app();
        let (status, _, _) = fetch(app.clone(), "/content-img/../../secret.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = fetch(app, "/content-img/%2E%2E/%2E%2E/secret.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_highlight_css() {
        let (_dir, app) = test_app();
        let (status, headers, _) = fetch(app, "/highlight.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header_value(&headers, "content-type"), Some("text/css; charset=utf-8"));
    }
}
