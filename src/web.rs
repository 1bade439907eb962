use crate::{
    config::Config,
    covers::{
        find_random_cover_item, ComicVineClient, CoverResponse, CoverSource, ErrorResponse,
        JikanClient, RetryPolicy, SourceError, SourceKind,
    },
};
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};

mod https;
mod ratelimit;

pub use ratelimit::RateLimits;

#[derive(Clone)]
pub struct SharedState {
    pub comic: Arc<dyn CoverSource>,
    pub anime: Arc<dyn CoverSource>,
    pub policy: RetryPolicy,
    pub limits: Arc<RateLimits>,
    pub force_https: bool,
}

impl SharedState {
    pub fn new(comic: Arc<dyn CoverSource>, anime: Arc<dyn CoverSource>, config: &Config) -> Self {
        Self {
            comic,
            anime,
            policy: config.retry_policy(),
            limits: Arc::new(RateLimits::new(&config.rate_limit)),
            force_https: config.force_https,
        }
    }

    /// Builds the live upstream clients described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let comic = ComicVineClient::new(
            config.comic_vine_api_key.clone(),
            &config.comicvine_base_url,
            config.request_timeout(),
            config.max_random_offset,
        )?;
        log::info!("Comic Vine client initialized");

        let anime = JikanClient::new(&config.jikan_base_url, config.request_timeout())?;
        log::info!("Jikan anime client initialized");

        Ok(Self::new(Arc::new(comic), Arc::new(anime), config))
    }
}

pub fn router(state: SharedState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let cover_routes = Router::new()
        .route("/random-comic", get(random_comic))
        .route("/random-anime", get(random_anime))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::limit_requests,
        ));

    Router::new()
        .route_service("/", ServeFile::new(format!("{static_dir}/index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/health", get(health))
        .route("/modes", get(modes))
        .merge(cover_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            https::redirect_to_https,
        ))
        .layer(cors)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::warn!("shutting down");
}

async fn start_app(state: SharedState, config: &Config) -> anyhow::Result<()> {
    let app = router(state, &config.static_dir);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

pub fn start_daemon(config: &Config) -> anyhow::Result<()> {
    // upstream clients are blocking; keep them owned outside the runtime
    let state = SharedState::from_config(config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(state, config))
}

/// A failed discovery, tagged with the mode it was for.
#[derive(Debug)]
struct HttpError {
    kind: SourceKind,
    err: SourceError,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.err {
            SourceError::MisconfiguredSource(_) => log::warn!("{} request refused: {}", self.kind, self.err),
            _ => log::error!("Error fetching {}: {:?}", self.kind, self.err),
        }

        let (status, body) = ErrorResponse::from_source_error(&self.err, self.kind);
        (status, Json(body)).into_response()
    }
}

fn random_cover(source: Arc<dyn CoverSource>, policy: RetryPolicy) -> Result<Json<CoverResponse>, HttpError> {
    let kind = source.kind();

    tokio::task::block_in_place(move || {
        find_random_cover_item(source.as_ref(), &policy)
            .map(|discovery| Json(discovery.into()))
            .map_err(|err| HttpError { kind, err })
    })
}

async fn random_comic(State(state): State<SharedState>) -> Result<Json<CoverResponse>, HttpError> {
    random_cover(state.comic.clone(), state.policy.clone())
}

async fn random_anime(State(state): State<SharedState>) -> Result<Json<CoverResponse>, HttpError> {
    random_cover(state.anime.clone(), state.policy.clone())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModesResponse {
    pub comic: bool,
    pub anime: bool,
}

async fn modes(State(state): State<SharedState>) -> Json<ModesResponse> {
    Json(ModesResponse {
        comic: state.comic.ensure_configured().is_ok(),
        anime: state.anime.ensure_configured().is_ok(),
    })
}
