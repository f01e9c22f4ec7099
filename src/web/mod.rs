// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web gallery for browsing and captioning a dataset

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::dataset::{DatasetManager, ImageRecord};
use crate::{Result, YaictError};

/// Shared application state.
///
/// Every dataset call goes through the one mutex, so ingestion and caption
/// writes from concurrent requests are serialised.
pub struct AppState {
    dataset: Mutex<DatasetManager>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(dataset: DatasetManager, config: AppConfig) -> Self {
        Self {
            dataset: Mutex::new(dataset),
            config,
        }
    }

    /// Run `f` with exclusive access to the dataset
    pub fn with_dataset<T>(&self, f: impl FnOnce(&mut DatasetManager) -> Result<T>) -> Result<T> {
        let mut dataset = self
            .dataset
            .lock()
            .map_err(|_| YaictError::InvalidState("Dataset lock poisoned".to_string()))?;
        f(&mut dataset)
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(index_page))
        // Files
        .route("/images/:id", get(serve_image))
        .route("/thumbnails/:id", get(serve_thumbnail))
        // API endpoints
        .route("/api/images", get(api_list_images))
        .route("/api/images/:id", get(api_get_image))
        .route("/api/images/:id/caption", get(api_get_caption).put(api_set_caption))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Page Handlers ===

/// Gallery entry as rendered on the index page
struct GalleryItem {
    id: String,
    group: String,
    caption: Option<String>,
}

async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    let items = state.with_dataset(|dataset| {
        Ok(dataset
            .records()
            .map(|record| GalleryItem {
                id: record.id.clone(),
                group: record.group.clone(),
                caption: dataset.caption(&record.id).ok().flatten(),
            })
            .collect::<Vec<_>>())
    });

    match items {
        Ok(items) => Html(render_gallery(&items)).into_response(),
        Err(e) => internal_error(e),
    }
}

// === File Handlers ===

async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    match state.with_dataset(|dataset| dataset.image_path_by_id(&id)) {
        Ok(path) => serve_file(path, request).await,
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Image not found").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn serve_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    match state.with_dataset(|dataset| Ok(dataset.thumbnail_path_by_id(&id))) {
        Ok(Some(path)) => serve_file(path, request).await,
        Ok(None) => (StatusCode::NOT_FOUND, "Thumbnail not found").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn serve_file(path: PathBuf, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

// === API Handlers ===

#[derive(Serialize)]
struct ImageResponse {
    #[serde(flatten)]
    record: ImageRecord,
    image_url: String,
    thumbnail_url: String,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        Self {
            image_url: format!("/images/{}", record.id),
            thumbnail_url: format!("/thumbnails/{}", record.id),
            record,
        }
    }
}

async fn api_list_images(State(state): State<Arc<AppState>>) -> Response {
    let records = state.with_dataset(|dataset| Ok(dataset.records().cloned().collect::<Vec<_>>()));
    match records {
        Ok(records) => {
            let body: Vec<ImageResponse> = records.into_iter().map(ImageResponse::from).collect();
            Json(body).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn api_get_image(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.with_dataset(|dataset| Ok(dataset.info_by_id(&id).cloned())) {
        Ok(Some(record)) => Json(ImageResponse::from(record)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Image not found").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn api_get_caption(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.with_dataset(|dataset| dataset.caption(&id)) {
        Ok(Some(caption)) => caption.into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Caption not found").into_response(),
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Image not found").into_response(),
        Err(e) => internal_error(e),
    }
}

async fn api_set_caption(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caption: String,
) -> Response {
    match state.with_dataset(|dataset| dataset.set_caption(&id, &caption)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) if e.is_not_found() => (StatusCode::NOT_FOUND, "Image not found").into_response(),
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: YaictError) -> Response {
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

// === Template Rendering ===

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - YAICT</title>
    <style>
        :root {{
            --bg-primary: #1a1a2e;
            --bg-card: #0f3460;
            --text-primary: #e8e8e8;
            --text-secondary: #a0a0a0;
            --accent: #e94560;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
        }}
        .container {{ max-width: 1400px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: var(--accent); margin-bottom: 10px; }}
        .subtitle {{ color: var(--text-secondary); margin-bottom: 20px; }}
        .gallery {{ display: flex; flex-wrap: wrap; gap: 20px; }}
        .item {{
            position: relative;
            width: 150px;
            background: var(--bg-card);
            border-radius: 8px;
            padding: 8px;
        }}
        .item img {{ width: 134px; height: 134px; object-fit: contain; }}
        .item input {{ position: absolute; bottom: 10px; right: 10px; }}
        .item .group {{ font-size: 0.8em; color: var(--text-secondary); }}
        .item .caption {{ font-size: 0.85em; overflow-wrap: anywhere; }}
    </style>
</head>
<body>
    <main class="container">
        {}
    </main>
</body>
</html>"#, escape_html(title), content)
}

fn render_gallery(items: &[GalleryItem]) -> String {
    let items_html: String = items.iter()
        .map(|item| {
            let id = escape_html(&item.id);
            format!(r#"
            <div class="item">
                <a href="/images/{id}"><img src="/thumbnails/{id}" alt="{group}"></a>
                <div class="group">{group}</div>
                <div class="caption">{caption}</div>
                <input type="checkbox" id="checkbox-{id}" value="{id}">
            </div>"#,
                id = id,
                group = escape_html(&item.group),
                caption = item.caption.as_deref().map(escape_html).unwrap_or_default(),
            )
        })
        .collect();

    let content = format!(r#"
        <h1>Hello World</h1>
        <p class="subtitle">Welcome to YAICT - Yet Another Image Captioning Tool. {} images.</p>
        <div class="gallery">{}</div>
    "#, items.len(), items_html);

    base_template("Gallery", &content)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Start the web server with config and dataset
pub async fn start_server(config: AppConfig, dataset: DatasetManager) -> Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(dataset, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gallery available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn test_state() -> (TempDir, Arc<AppState>, String) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("banana.png");
        RgbImage::from_pixel(200, 100, Rgb([250, 220, 40])).save(&source).unwrap();

        let mut dataset = DatasetManager::open(dir.path().join("data")).unwrap();
        let id = dataset.add_image(&source, false).unwrap();
        dataset.set_caption(&id, "a <ripe> banana").unwrap();

        let state = Arc::new(AppState::new(dataset, AppConfig::default()));
        (dir, state, id)
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_uri(state: &Arc<AppState>, uri: &str) -> (StatusCode, Vec<u8>) {
        send(state, Method::GET, uri, Body::empty()).await
    }

    #[tokio::test]
    async fn test_serve_image_bytes() {
        let (dir, state, id) = test_state();
        let (status, body) = get_uri(&state, &format!("/images/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, std::fs::read(dir.path().join("banana.png")).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_image_is_404() {
        let (_dir, state, _) = test_state();
        let (status, body) = get_uri(&state, "/images/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Image not found");
    }

    #[tokio::test]
    async fn test_serve_thumbnail_and_missing_thumbnail() {
        let (_dir, state, id) = test_state();
        let (status, body) = get_uri(&state, &format!("/thumbnails/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        let thumb = image::load_from_memory(&body).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (128, 64));

        let path = state.with_dataset(|d| Ok(d.thumbnail_path(&id))).unwrap().unwrap();
        std::fs::remove_file(path).unwrap();
        let (status, body) = get_uri(&state, &format!("/thumbnails/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Thumbnail not found");
    }

    #[tokio::test]
    async fn test_api_lists_images() {
        let (_dir, state, id) = test_state();
        let (status, body) = get_uri(&state, "/api/images").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id.as_str());
        assert_eq!(list[0]["group"], "banana");
        assert_eq!(list[0]["caption_extension"], ".txt");
        assert_eq!(list[0]["thumbnail_url"], format!("/thumbnails/{}", id));
    }

    #[tokio::test]
    async fn test_api_get_image() {
        let (_dir, state, id) = test_state();
        let (status, _) = get_uri(&state, &format!("/api/images/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get_uri(&state, "/api/images/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_caption_roundtrip_over_http() {
        let (_dir, state, id) = test_state();
        let uri = format!("/api/images/{}/caption", id);

        let (status, _) = send(&state, Method::PUT, &uri, Body::from("peeled")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = get_uri(&state, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"peeled");

        let (status, _) = send(&state, Method::PUT, "/api/images/nobody/caption", Body::from("x")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_renders_escaped_captions() {
        let (_dir, state, id) = test_state();
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(&format!("/thumbnails/{}", id)));
        assert!(html.contains("a &lt;ripe&gt; banana"));
        assert!(!html.contains("<ripe>"));
    }
}
