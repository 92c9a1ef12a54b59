use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::images::{self, ImageSize};
use super::models::{
    CatalogItem, MediaType, MovieDetails, Paged, Review, SeasonDetails, ShowDetails,
    TrendingEntry, VideoList,
};
use super::{CatalogError, CatalogTransport, RawResponse};
use crate::config::CatalogConfig;

const MOVIE_APPEND: &str = "credits,videos,similar,reviews";
const SHOW_APPEND: &str = "credits,videos,similar,reviews,content_ratings";
const SEASON_APPEND: &str = "credits,videos,images,external_ids";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// reqwest backed transport used outside of tests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Only the connect phase is bounded here. The per-call deadline belongs
    /// to [`CatalogClient`] so that it surfaces as [`CatalogError::Timeout`].
    pub fn new() -> anyhow::Result<Self> {
        let user_agent = format!("moviefun/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> anyhow::Result<RawResponse> {
        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request failed")?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("reading body failed")?;
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingScope {
    All,
    Movie,
    Tv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
}

/// Catalog API facade: one method per endpoint, each a preset over
/// [`CatalogClient::fetch_resource`].
#[derive(Clone)]
pub struct CatalogClient {
    config: Arc<CatalogConfig>,
    transport: Arc<dyn CatalogTransport>,
}

impl fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("api_base", &self.config.api_base)
            .field("language", &self.config.language)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: CatalogConfig, transport: Arc<dyn CatalogTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Full request URL for `path`. Key and locale come first; parameters with
    /// an empty value are left out entirely.
    pub fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
        if !path.starts_with('/') {
            return Err(CatalogError::InvalidRequest(format!(
                "resource path must start with '/': {path}"
            )));
        }
        let raw = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| CatalogError::InvalidRequest(format!("{path}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", &self.config.api_key);
            query.append_pair("language", &self.config.language);
            for (key, value) in params {
                if !value.is_empty() {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    /// One GET against the catalog, body returned as untyped JSON.
    pub async fn fetch_resource(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, CatalogError> {
        self.fetch(path, params).await
    }

    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> String {
        images::image_url(&self.config.image_base, path, size)
    }

    pub fn image_url_or(&self, path: Option<&str>, size: ImageSize, placeholder: &str) -> String {
        images::image_url_or(&self.config.image_base, path, size, placeholder)
    }

    pub async fn movie_details(&self, id: u64) -> Result<MovieDetails, CatalogError> {
        self.fetch(
            &format!("/movie/{id}"),
            &[("append_to_response", MOVIE_APPEND)],
        )
        .await
    }

    pub async fn show_details(&self, id: u64) -> Result<ShowDetails, CatalogError> {
        self.fetch(&format!("/tv/{id}"), &[("append_to_response", SHOW_APPEND)])
            .await
    }

    pub async fn movie_videos(&self, id: u64) -> Result<VideoList, CatalogError> {
        self.fetch(&format!("/movie/{id}/videos"), &[]).await
    }

    pub async fn show_videos(&self, id: u64) -> Result<VideoList, CatalogError> {
        self.fetch(&format!("/tv/{id}/videos"), &[]).await
    }

    pub async fn season_details(
        &self,
        show_id: u64,
        season: u32,
    ) -> Result<SeasonDetails, CatalogError> {
        self.fetch(
            &format!("/tv/{show_id}/season/{season}"),
            &[("append_to_response", SEASON_APPEND)],
        )
        .await
    }

    pub async fn similar_movies(&self, id: u64) -> Result<Paged<CatalogItem>, CatalogError> {
        self.fetch(&format!("/movie/{id}/similar"), &[]).await
    }

    pub async fn similar_shows(&self, id: u64) -> Result<Paged<CatalogItem>, CatalogError> {
        self.fetch(&format!("/tv/{id}/similar"), &[]).await
    }

    pub async fn movie_reviews(&self, id: u64) -> Result<Paged<Review>, CatalogError> {
        self.fetch(&format!("/movie/{id}/reviews"), &[]).await
    }

    pub async fn show_reviews(&self, id: u64) -> Result<Paged<Review>, CatalogError> {
        self.fetch(&format!("/tv/{id}/reviews"), &[]).await
    }

    pub async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paged<CatalogItem>, CatalogError> {
        self.search("/search/movie", query, page).await
    }

    pub async fn search_shows(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paged<CatalogItem>, CatalogError> {
        self.search("/search/tv", query, page).await
    }

    pub async fn trending(
        &self,
        scope: TrendingScope,
        window: TimeWindow,
    ) -> Result<Paged<CatalogItem>, CatalogError> {
        let window = match window {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        };
        match scope {
            TrendingScope::Movie => self.fetch(&format!("/trending/movie/{window}"), &[]).await,
            TrendingScope::Tv => self.fetch(&format!("/trending/tv/{window}"), &[]).await,
            TrendingScope::All => {
                let path = format!("/trending/all/{window}");
                let page: Paged<TrendingEntry> = self.fetch(&path, &[]).await?;
                let results = page
                    .results
                    .into_iter()
                    .filter_map(TrendingEntry::into_item)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|msg| CatalogError::Parse {
                        path: path.clone(),
                        source: serde::de::Error::custom(msg),
                    })?;
                Ok(Paged {
                    page: page.page,
                    results,
                    total_pages: page.total_pages,
                    total_results: page.total_results,
                })
            }
        }
    }

    pub async fn top_rated(&self, kind: MediaType) -> Result<Paged<CatalogItem>, CatalogError> {
        self.fetch(&format!("/{}/top_rated", kind.as_path()), &[])
            .await
    }

    pub async fn popular(&self, kind: MediaType) -> Result<Paged<CatalogItem>, CatalogError> {
        self.fetch(&format!("/{}/popular", kind.as_path()), &[])
            .await
    }

    pub async fn discover_movies(
        &self,
        genre_id: u32,
    ) -> Result<Paged<CatalogItem>, CatalogError> {
        let genre = genre_id.to_string();
        self.fetch("/discover/movie", &[("with_genres", genre.as_str())])
            .await
    }

    async fn search(
        &self,
        path: &str,
        query: &str,
        page: u32,
    ) -> Result<Paged<CatalogItem>, CatalogError> {
        let page = page.max(1).to_string();
        self.fetch(
            path,
            &[("query", query), ("page", page.as_str()), ("include_adult", "false")],
        )
        .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = self.build_url(path, params)?;
        debug!(path = %path, "catalog request");
        let result = self.get_parsed(path, &url).await;
        if let Err(e) = &result {
            if e.is_not_found() {
                debug!(path = %path, "catalog resource not found");
            } else {
                warn!(path = %path, error = %e, "catalog request failed");
            }
        }
        result
    }

    /// Transport messages may echo the request URL; the key never leaves.
    fn redact(&self, message: &str) -> String {
        let key = &self.config.api_key;
        if key.is_empty() {
            message.to_string()
        } else {
            message.replace(key.as_str(), "<redacted>")
        }
    }

    async fn get_parsed<T: DeserializeOwned>(&self, path: &str, url: &Url) -> Result<T, CatalogError> {
        let after = self.config.request_timeout;
        let res = tokio::time::timeout(after, self.transport.get(url))
            .await
            .map_err(|_| CatalogError::Timeout {
                path: path.to_string(),
                after,
            })?
            .map_err(|e| CatalogError::Transport {
                path: path.to_string(),
                message: self.redact(&format!("{e:#}")),
            })?;
        if res.status == 404 {
            return Err(CatalogError::NotFound {
                path: path.to_string(),
            });
        }
        if !res.is_success() {
            return Err(CatalogError::Upstream {
                path: path.to_string(),
                status: res.status,
                status_text: res.status_text,
            });
        }
        serde_json::from_str(&res.body).map_err(|source| CatalogError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, RawResponse>,
        seen: Mutex<Vec<Url>>,
        delay: Option<Duration>,
    }

    impl FakeTransport {
        fn with(mut self, path: &str, status: u16, body: serde_json::Value) -> Self {
            self.responses.insert(
                path.to_string(),
                RawResponse {
                    status,
                    status_text: if status == 200 { "OK" } else { "Bad Gateway" }.to_string(),
                    body: body.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl CatalogTransport for FakeTransport {
        async fn get(&self, url: &Url) -> anyhow::Result<RawResponse> {
            self.seen.lock().unwrap().push(url.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .get(url.path())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn client(transport: FakeTransport) -> (CatalogClient, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        let mut config = CatalogConfig::new("secret");
        config.api_base = "http://catalog.test".to_string();
        config.request_timeout = Duration::from_millis(50);
        (
            CatalogClient::with_transport(config, transport.clone()),
            transport,
        )
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn build_url_appends_key_locale_and_non_empty_params() {
        let (client, _) = client(FakeTransport::default());
        let url = client
            .build_url(
                "/search/movie",
                &[("query", "the thing & co"), ("page", ""), ("include_adult", "false")],
            )
            .unwrap();
        assert_eq!(url.path(), "/search/movie");
        let pairs = query(&url);
        assert_eq!(
            pairs,
            vec![
                ("api_key".to_string(), "secret".to_string()),
                ("language".to_string(), "en-US".to_string()),
                ("query".to_string(), "the thing & co".to_string()),
                ("include_adult".to_string(), "false".to_string()),
            ]
        );
        assert!(!url.as_str().contains("page="));
        assert_eq!(url.as_str().matches("query=").count(), 1);
        assert!(url.as_str().contains("query=the+thing+%26+co"));
    }

    #[test]
    fn build_url_rejects_relative_paths() {
        let (client, _) = client(FakeTransport::default());
        let err = client.build_url("movie/1", &[]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn movie_details_expands_sub_resources() {
        let (client, transport) = client(FakeTransport::default().with(
            "/movie/7",
            200,
            json!({"id": 7, "title": "Se7en", "runtime": 127}),
        ));
        let details = client.movie_details(7).await.unwrap();
        assert_eq!(details.item.title, "Se7en");
        let seen = transport.seen.lock().unwrap();
        let pairs = query(&seen[0]);
        assert!(pairs.contains(&(
            "append_to_response".to_string(),
            "credits,videos,similar,reviews".to_string()
        )));
    }

    #[tokio::test]
    async fn not_found_is_distinguished_from_other_statuses() {
        let (client, _) = client(
            FakeTransport::default()
                .with("/movie/404", 404, json!({"status_code": 34}))
                .with("/movie/500", 502, json!({})),
        );
        assert!(client.movie_details(404).await.unwrap_err().is_not_found());
        match client.movie_details(500).await.unwrap_err() {
            CatalogError::Upstream {
                status,
                status_text,
                path,
            } => {
                assert_eq!(status, 502);
                assert_eq!(status_text, "Bad Gateway");
                assert_eq!(path, "/movie/500");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_and_parse_failures_are_typed() {
        let (client, _) = client(FakeTransport::default().with(
            "/movie/1/videos",
            200,
            json!({"results": [{"site": "YouTube"}]}),
        ));
        assert!(matches!(
            client.movie_videos(1).await.unwrap_err(),
            CatalogError::Parse { .. }
        ));
        assert!(matches!(
            client.movie_videos(2).await.unwrap_err(),
            CatalogError::Transport { .. }
        ));
    }

    #[tokio::test]
    async fn slow_upstream_hits_the_deadline() {
        let mut transport = FakeTransport::default().with("/tv/1", 200, json!({"id": 1, "name": "x"}));
        transport.delay = Some(Duration::from_secs(5));
        let (client, _) = client(transport);
        let err = client.show_details(1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Timeout { .. }));
    }

    #[tokio::test]
    async fn search_sends_page_and_adult_flag() {
        let (client, transport) = client(FakeTransport::default().with(
            "/search/tv",
            200,
            json!({"page": 2, "results": [{"id": 1, "name": "Dark"}], "total_pages": 3, "total_results": 41}),
        ));
        let page = client.search_shows("dark", 2).await.unwrap();
        assert_eq!(page.results[0].media_type, MediaType::Tv);
        let seen = transport.seen.lock().unwrap();
        let pairs = query(&seen[0]);
        assert!(pairs.contains(&("page".to_string(), "2".to_string())));
        assert!(pairs.contains(&("include_adult".to_string(), "false".to_string())));
    }

    #[tokio::test]
    async fn trending_all_keeps_movies_and_shows() {
        let (client, _) = client(FakeTransport::default().with(
            "/trending/all/week",
            200,
            json!({"results": [
                {"media_type": "movie", "id": 1, "title": "A"},
                {"media_type": "person", "id": 2, "name": "P"},
                {"media_type": "tv", "id": 3, "name": "B"}
            ]}),
        ));
        let page = client
            .trending(TrendingScope::All, TimeWindow::Week)
            .await
            .unwrap();
        let ids: Vec<u64> = page.results.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn fetch_resource_returns_raw_json() {
        let (client, _) = client(FakeTransport::default().with(
            "/configuration",
            200,
            json!({"images": {"base_url": "x"}}),
        ));
        let value = client.fetch_resource("/configuration", &[]).await.unwrap();
        assert_eq!(value["images"]["base_url"], "x");
    }

    struct EchoingTransport;

    #[async_trait]
    impl CatalogTransport for EchoingTransport {
        async fn get(&self, url: &Url) -> anyhow::Result<RawResponse> {
            Err(anyhow::anyhow!("error sending request for url ({url})"))
        }
    }

    fn live_config(addr: std::net::SocketAddr) -> CatalogConfig {
        let mut config = CatalogConfig::new("secret");
        config.api_base = format!("http://{addr}");
        config.request_timeout = Duration::from_millis(300);
        config
    }

    #[tokio::test]
    async fn silent_upstream_times_out_over_http() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let client = CatalogClient::new(live_config(addr)).unwrap();
        for _ in 0..3 {
            let err = client.movie_details(1).await.unwrap_err();
            assert!(matches!(err, CatalogError::Timeout { .. }), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn refused_connection_message_hides_the_key() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = CatalogClient::new(live_config(addr)).unwrap();
        match client.movie_details(1).await.unwrap_err() {
            CatalogError::Transport { message, .. } => {
                assert!(!message.contains("secret"), "{message}");
                assert!(!message.contains("api_key"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_messages_are_redacted() {
        let mut config = CatalogConfig::new("secret");
        config.api_base = "http://catalog.test".to_string();
        let client = CatalogClient::with_transport(config, Arc::new(EchoingTransport));
        let err = client.show_videos(3).await.unwrap_err();
        let CatalogError::Transport { message, .. } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(message.contains("/tv/3/videos"));
        assert!(!message.contains("secret"));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn image_urls_use_configured_cdn() {
        let (client, _) = client(FakeTransport::default());
        assert_eq!(
            client.image_url(Some("/p.jpg"), ImageSize::Original),
            "https://image.tmdb.org/t/p/original/p.jpg"
        );
        assert_eq!(client.image_url(None, ImageSize::W500), "/no-image.jpg");
    }
}
