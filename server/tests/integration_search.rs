use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use cinefind_core::document::save_docs;
use cinefind_core::{
    Analyzer, DocStore, IndexCodec, MovieRecord, PositionalIndex, SearchConfig,
};
use cinefind_server::{build_app, SearchState};

fn movie(id: &str, title: &str, director: &str, plot: &str) -> MovieRecord {
    MovieRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        director: Some(director.to_string()),
        cast: Vec::new(),
        plot: Some(plot.to_string()),
    }
}

/// Index two movies through the real pipeline and persist both artifacts.
fn build_tiny_corpus(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let analyzer = Analyzer::default();
    let records = [
        movie(
            "tt0499549",
            "Avatar",
            "James Cameron",
            "blue people defend their home world from invaders",
        ),
        movie(
            "tt1375666",
            "Inception",
            "Christopher Nolan",
            "a thief enters dreams to plant an idea",
        ),
    ];

    let mut index = PositionalIndex::new();
    let mut docs = DocStore::new();
    for record in &records {
        for (field, tokens) in record.field_tokens(&analyzer) {
            index.add_tokens(&record.id, field, &tokens);
        }
        docs.insert(record.id.clone(), record.clone());
    }

    let index_path = dir.join("index.txt");
    let docs_path = dir.join("docs.json");
    IndexCodec::new(&SearchConfig::default())
        .save(&index, &index_path)
        .unwrap();
    save_docs(&docs_path, &docs).unwrap();
    (index_path, docs_path)
}

fn test_app(dir: &std::path::Path) -> Router {
    let (index_path, docs_path) = build_tiny_corpus(dir);
    let state = SearchState::load(index_path, docs_path).unwrap();
    build_app(Arc::new(RwLock::new(state)))
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn free_text_queries_are_ranked() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, json) = call(app, "/search?q=blue%20people").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "tt0499549");
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn structured_queries_hit_the_boolean_evaluator() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, json) = call(app.clone(), "/search?q=director:nolan").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "tt1375666");
    // boolean hits carry no score
    assert!(results[0].get("score").is_none());

    let (status, json) = call(app, "/search?q=plot:%22blue%20people%22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["id"], "tt0499549");
}

#[tokio::test]
async fn pagination_reports_totals() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    // both movies match: one on title, one on plot
    let (status, json) = call(app, "/search?q=title:avatar%20OR%20plot:dreams&page=1&page_size=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_queries_are_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, _) = call(app.clone(), "/search?q=blue%20AND%20NOT").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // an unknown qualifier inside a structured query is rejected...
    let (status, _) = call(app.clone(), "/search?q=title:avatar%20AND%20genre:comedy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // ...but on its own it never reaches the boolean path: the dispatch
    // only recognizes supported fields, so it ranks as free text
    let (status, json) = call(app, "/search?q=genre:comedy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn movies_hydrate_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let (status, json) = call(app.clone(), "/movie/tt0499549").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Avatar");

    let (status, _) = call(app, "/movie/tt9999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
