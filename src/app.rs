use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api,
    auth::{self, SessionManager},
    config::{AppConfig, StorageBackend},
    fetcher::{PageFetcher, WebContentSource},
    middleware::{assign_trace_id, TraceId},
    repo::{self, memory::MemoryStore, PgStore, Store},
    service::news::NewsService,
    util::{
        newsapi::NewsApiClient,
        summarizer::{ConfiguredModelLoader, Summarizer},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionManager,
    pub news: Arc<NewsService>,
    pub storage: StorageBackend,
}

pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.db.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db.max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect(&config.db.url)
                .await
                .context("failed to connect to postgres")?;

            repo::migrations::ensure_schema(&pool)
                .await
                .context("failed to prepare database schema")?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, saved data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = open_store(config).await?;

    if config.news_api.api_key.is_none() {
        tracing::warn!("NEWS_API_KEY is not set, news endpoints will fail");
    }
    let provider = NewsApiClient::new(config.news_api.clone())?;
    let content = WebContentSource::new(PageFetcher::new(&config.scraper)?);
    // The model is loaded on the first summary request, not here.
    let summarizer = Summarizer::new(ConfiguredModelLoader::new(config.summarizer.clone()));
    tracing::info!(
        provider = config.summarizer.provider.as_str(),
        "summarizer configured"
    );

    let sessions = SessionManager::new(
        Duration::from_secs(config.auth.access_ttl_secs),
        Duration::from_secs(config.auth.refresh_ttl_secs),
    );

    Ok(AppState {
        store,
        sessions,
        news: Arc::new(NewsService::new(
            Arc::new(provider),
            Arc::new(content),
            Arc::new(summarizer),
        )),
        storage: config.db.backend,
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|id| id.0.as_str())
            .unwrap_or("-");
        tracing::info_span!(
            "http",
            method = %req.method(),
            path = %req.uri().path(),
            trace_id = %trace_id,
        )
    });
    let middleware = ServiceBuilder::new()
        .layer(middleware::from_fn(assign_trace_id))
        .layer(trace)
        .layer(cors);

    let protected = Router::new()
        .route("/latest/", get(api::news::latest))
        .route("/search/", get(api::news::search))
        .route("/save/", post(api::saved::save_article))
        .route("/saved/", get(api::saved::list_saved))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    let public_api = Router::new()
        .route("/register/", post(api::accounts::register))
        .route("/token/", post(api::accounts::obtain_token))
        .route("/token/refresh/", post(api::accounts::refresh_token))
        .merge(protected);

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .nest("/api", public_api)
        .layer(middleware)
        .with_state(state)
}
