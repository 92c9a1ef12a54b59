use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{cancellable, Card, PageAggregator};
use crate::catalog::models::MediaType;
use crate::catalog::CatalogError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub media_type: MediaType,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<Card>,
}

impl PageAggregator {
    /// One page of title search results. Blank queries are refused before any
    /// catalog call is made.
    pub async fn search(
        &self,
        kind: MediaType,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<SearchPage, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }
        let found = match kind {
            MediaType::Movie => cancellable(cancel, self.client.search_movies(query, page)).await?,
            MediaType::Tv => cancellable(cancel, self.client.search_shows(query, page)).await?,
        };
        let page = SearchPage {
            query: query.to_string(),
            media_type: kind,
            page: found.page,
            total_pages: found.total_pages,
            total_results: found.total_results,
            results: self.cards(found.results),
        };
        info!(
            query = %page.query,
            media_type = kind.as_path(),
            results = page.results.len(),
            "search page assembled"
        );
        Ok(page)
    }
}
