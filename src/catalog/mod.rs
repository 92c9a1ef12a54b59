use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;

mod client;
mod error;
pub mod images;
pub mod models;

pub use client::{CatalogClient, ReqwestTransport, TimeWindow, TrendingScope};
pub use error::CatalogError;
pub use images::{ImageSize, ThumbnailQuality};

/// Status line and body of one upstream response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single HTTP GET the catalog client depends on. Swapped for a fake in tests.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse>;
}
