use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use cinefind_core::document::load_docs;
use cinefind_core::{
    Analyzer, Corpus, DocStore, IndexCodec, MovieRecord, PositionalIndex, Ranker, SearchConfig,
    Searcher,
};

/// Everything a query needs, loaded once and swapped wholesale on reload.
pub struct SearchState {
    pub index: PositionalIndex,
    pub analyzer: Analyzer,
    pub config: SearchConfig,
    pub ranker: Ranker,
    pub docs: DocStore,
}

impl SearchState {
    /// Load the persisted index and metadata store, rebuilding the ranked
    /// corpus from the stored records. The analyzer settings must match the
    /// ones the index was built with.
    pub fn load(index_path: impl AsRef<Path>, docs_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = SearchConfig::default();
        let analyzer = Analyzer::default();
        let index = IndexCodec::new(&config).load(index_path.as_ref())?;
        let docs = load_docs(docs_path.as_ref())?;
        let corpus: Corpus = docs
            .values()
            .map(|record| (record.id.clone(), record.corpus_tokens(&analyzer)))
            .collect();
        let ranker = Ranker::new(&index, &corpus);
        tracing::info!(
            num_docs = docs.len(),
            num_terms = index.term_count(),
            "search state loaded"
        );
        Ok(SearchState {
            index,
            analyzer,
            config,
            ranker,
            docs,
        })
    }
}

pub type SharedState = Arc<RwLock<SearchState>>;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}
fn default_page() -> usize {
    1
}
fn default_page_size() -> usize {
    50
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub movie: MovieRecord,
}

/// Boolean queries go to the evaluator, free text to the ranker: the query
/// is structured when it uses a supported field qualifier, a boolean
/// keyword, a quoted phrase, or the proximity syntax.
pub fn is_structured_query(query: &str, config: &SearchConfig) -> bool {
    if query.contains('"') || query.contains('#') {
        return true;
    }
    if query
        .split_whitespace()
        .any(|t| t == "AND" || t == "OR" || t == "NOT")
    {
        return true;
    }
    let lowered = query.to_lowercase();
    config
        .fields
        .iter()
        .any(|field| lowered.contains(&format!("{field}:")))
}

pub fn build_app(state: SharedState) -> Router {
    // CORS: comma-separated CORS_ALLOW_ORIGIN, permissive by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/movie/:id", get(movie_handler))
        .with_state(state)
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = Instant::now();
    let st = state.read();

    let scored: Vec<(String, Option<f64>)> = if is_structured_query(&params.q, &st.config) {
        let searcher = Searcher::new(&st.index, &st.analyzer, &st.config);
        let docs = searcher
            .query(&params.q)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        docs.into_iter().map(|id| (id, None)).collect()
    } else {
        st.ranker
            .score(&st.analyzer, &params.q)
            .into_iter()
            .map(|(id, score)| (id, Some(score)))
            .collect()
    };

    let total = scored.len();
    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 200);
    let total_pages = total.div_ceil(page_size);
    let results = scored
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .filter_map(|(id, score)| {
            st.docs.get(&id).map(|movie| SearchHit {
                score,
                movie: movie.clone(),
            })
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total,
        page,
        page_size,
        total_pages,
        results,
    }))
}

pub async fn movie_handler(
    State(state): State<SharedState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<MovieRecord>, (StatusCode, String)> {
    let st = state.read();
    st.docs
        .get(&id)
        .map(|movie| Json(movie.clone()))
        .ok_or((StatusCode::NOT_FOUND, "movie not found".to_string()))
}
