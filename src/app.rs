use crate::catalog::models::MediaType;
use crate::catalog::{CatalogClient, CatalogError};
use crate::config::AppConfig;
use crate::pages::{HomePage, MoviePage, PageAggregator, SearchPage, SeasonView, ShowPage};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 16 * 1024; // reads only

#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<PageAggregator>,
    /// Cancelled on shutdown; every request renders under a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pages: PageAggregator) -> Self {
        Self {
            pages: Arc::new(pages),
            shutdown: CancellationToken::new(),
        }
    }
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    let client = CatalogClient::new(config.catalog.clone())?;
    info!(
        api_base = %config.catalog.api_base,
        language = %config.catalog.language,
        policy = ?config.failure_policy,
        "Catalog client ready"
    );
    let state = AppState::new(PageAggregator::new(client, config.failure_policy));
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/movie/:id", get(movie))
        .route("/api/tv/:id", get(show))
        .route("/api/tv/:id/season/:season", get(season))
        .route("/api/search/movie", get(search_movies))
        .route("/api/search/tv", get(search_shows))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// A [`CatalogError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
            CatalogError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CatalogError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CatalogError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Upstream { .. }
            | CatalogError::Transport { .. }
            | CatalogError::Parse { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            CatalogError::InvalidRequest(msg) => msg.clone(),
            other => other.reason(),
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "page request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "page request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type PageResult<T> = Result<Json<T>, ApiError>;

async fn home(State(state): State<AppState>) -> PageResult<HomePage> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.pages.home(&cancel).await?))
}

async fn movie(State(state): State<AppState>, Path(id): Path<u64>) -> PageResult<MoviePage> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.pages.movie(id, &cancel).await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<u64>) -> PageResult<ShowPage> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.pages.show(id, &cancel).await?))
}

async fn season(
    State(state): State<AppState>,
    Path((id, season)): Path<(u64, u32)>,
) -> PageResult<SeasonView> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.pages.season(id, season, &cancel).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<u32>,
}

async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> PageResult<SearchPage> {
    search(state, MediaType::Movie, params).await
}

async fn search_shows(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> PageResult<SearchPage> {
    search(state, MediaType::Tv, params).await
}

async fn search(
    state: AppState,
    kind: MediaType,
    params: SearchParams,
) -> PageResult<SearchPage> {
    let cancel = state.shutdown.child_token();
    let page = params.page.unwrap_or(1);
    Ok(Json(
        state.pages.search(kind, &params.query, page, &cancel).await?,
    ))
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (
                CatalogError::NotFound {
                    path: "/movie/1".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                CatalogError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CatalogError::Timeout {
                    path: "/movie/1".to_string(),
                    after: Duration::from_secs(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (CatalogError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (
                CatalogError::Upstream {
                    path: "/movie/1".to_string(),
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                CatalogError::Transport {
                    path: "/movie/1".to_string(),
                    message: "refused".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
