//! Page aggregation: each route declares its catalog calls, runs them
//! concurrently and reduces the results into the record its view renders.

use anyhow::anyhow;
use futures::future::{self, BoxFuture};
use serde::Serialize;
use std::future::Future;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::catalog::models::{CatalogItem, Paged, Review, Video};
use crate::catalog::{images, CatalogClient, CatalogError, ImageSize, ThumbnailQuality};
use crate::display;

mod home;
mod movie;
mod search;
pub mod select;
mod show;

pub use home::{HeroBanner, HomePage, HomeRow};
pub use movie::MoviePage;
pub use search::SearchPage;
pub use show::{EpisodeCard, SeasonCard, SeasonView, ShowPage};

const MORE_LIKE_THIS: usize = 6;

/// What a page does when one of its calls fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failure in a batch fails the whole page.
    FailFast,
    /// Secondary sections fail on their own; the primary resource still propagates.
    #[default]
    Degrade,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "degrade" => Ok(FailurePolicy::Degrade),
            other => Err(anyhow!(
                "failure policy must be 'fail-fast' or 'degrade', got '{other}'"
            )),
        }
    }
}

/// One independently fetched part of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Unavailable { reason: String },
}

impl<T> Section<T> {
    pub fn ready(data: T) -> Self {
        Section::Ready { data }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            Section::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Section<U> {
        match self {
            Section::Ready { data } => Section::Ready { data: f(data) },
            Section::Unavailable { reason } => Section::Unavailable { reason },
        }
    }

    /// Falls back to `fallback` when this section could not be fetched.
    pub fn or_else_ready(self, fallback: Option<T>) -> Self {
        match (self, fallback) {
            (Section::Unavailable { .. }, Some(data)) => Section::Ready { data },
            (section, _) => section,
        }
    }
}

/// Resolves one secondary call into a [`Section`] under `policy`.
///
/// Under [`FailurePolicy::FailFast`] the error is returned, which makes an
/// enclosing `try_join!` abort the batch. Cancellation always propagates.
pub(crate) async fn settle<T, F>(
    policy: FailurePolicy,
    section: &'static str,
    call: F,
) -> Result<Section<T>, CatalogError>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    resolve(policy, section, call.await)
}

/// [`settle`] for a call that has already finished.
pub(crate) fn resolve<T>(
    policy: FailurePolicy,
    section: &'static str,
    result: Result<T, CatalogError>,
) -> Result<Section<T>, CatalogError> {
    match result {
        Ok(data) => Ok(Section::Ready { data }),
        Err(CatalogError::Cancelled) => Err(CatalogError::Cancelled),
        Err(e) if policy == FailurePolicy::FailFast => Err(e),
        Err(e) => {
            warn!(section, error = %e, "page section unavailable");
            Ok(Section::Unavailable { reason: e.reason() })
        }
    }
}

/// Awaits every call of a batch together. The first failure aborts the rest
/// and no partial results are returned.
pub async fn join_all_or_fail<T, F>(
    calls: impl IntoIterator<Item = F>,
) -> Result<Vec<T>, CatalogError>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    future::try_join_all(calls).await
}

/// Runs `render` until it finishes or `cancel` fires, whichever is first.
/// Dropping the render drops every in-flight catalog call with it.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, render: F) -> Result<T, CatalogError>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CatalogError::Cancelled),
        res = render => res,
    }
}

/// Builds page records from catalog calls.
#[derive(Debug, Clone)]
pub struct PageAggregator {
    client: CatalogClient,
    policy: FailurePolicy,
}

impl PageAggregator {
    pub fn new(client: CatalogClient, policy: FailurePolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    fn card(&self, item: CatalogItem) -> Card {
        Card {
            image_url: self
                .client
                .image_url(item.hero_image_path(), ImageSize::W500),
            href: format!("/{}/{}", item.media_type.as_path(), item.id),
            year: display::release_year(item.date()),
            item,
        }
    }

    fn cards(&self, items: Vec<CatalogItem>) -> Vec<Card> {
        items.into_iter().map(|item| self.card(item)).collect()
    }

    /// "More Like This" cards, capped at [`MORE_LIKE_THIS`].
    fn similar_cards(&self, similar: Option<&Paged<CatalogItem>>) -> Vec<Card> {
        similar
            .map(|p| {
                p.results
                    .iter()
                    .take(MORE_LIKE_THIS)
                    .cloned()
                    .map(|item| self.card(item))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn hero_url(&self, item: &CatalogItem) -> String {
        self.client
            .image_url(item.hero_image_path(), ImageSize::Original)
    }
}

type BoxedCall<'a, T> = BoxFuture<'a, Result<T, CatalogError>>;

/// A title in a row, grid or search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub image_url: String,
    pub href: String,
    pub year: Option<String>,
}

/// A video the embedded player can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trailer {
    pub key: String,
    pub name: String,
    pub kind: String,
    pub official: bool,
    pub watch_url: String,
    pub thumbnail_url: String,
}

impl From<&Video> for Trailer {
    fn from(video: &Video) -> Self {
        Trailer {
            key: video.key.clone(),
            name: video.name.clone(),
            kind: video.kind.clone(),
            official: video.official,
            watch_url: images::youtube_watch_url(&video.key),
            thumbnail_url: images::youtube_thumbnail(&video.key, ThumbnailQuality::High),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCard {
    #[serde(flatten)]
    pub review: Review,
    pub stars: Option<String>,
}

impl From<Review> for ReviewCard {
    fn from(review: Review) -> Self {
        ReviewCard {
            stars: review.rating.map(display::review_stars),
            review,
        }
    }
}
