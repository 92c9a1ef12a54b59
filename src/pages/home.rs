use futures::future::{self, FutureExt};
use rand::Rng;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::select::pick_hero;
use super::{
    cancellable, join_all_or_fail, resolve, BoxedCall, Card, FailurePolicy, PageAggregator,
    Section,
};
use crate::catalog::models::{CatalogItem, MediaType, Paged};
use crate::catalog::{CatalogError, TimeWindow, TrendingScope};
use crate::display;

const HERO_OVERVIEW_CHARS: usize = 150;

#[derive(Debug, Clone, Copy)]
enum Feed {
    Trending(TrendingScope),
    TopRated(MediaType),
    Popular(MediaType),
    Discover { genre_id: u32 },
}

struct RowSpec {
    title: &'static str,
    /// `None` for mixed movie and show rows.
    media_type: Option<MediaType>,
    feed: Feed,
}

/// Rows of the home page, top to bottom. The first one also feeds the hero.
static HOME_ROWS: [RowSpec; 8] = [
    RowSpec {
        title: "Trending Now",
        media_type: None,
        feed: Feed::Trending(TrendingScope::All),
    },
    RowSpec {
        title: "Top Rated",
        media_type: Some(MediaType::Movie),
        feed: Feed::TopRated(MediaType::Movie),
    },
    RowSpec {
        title: "Popular on Movie.Fun",
        media_type: Some(MediaType::Tv),
        feed: Feed::Popular(MediaType::Tv),
    },
    RowSpec {
        title: "Action Movies",
        media_type: Some(MediaType::Movie),
        feed: Feed::Discover { genre_id: 28 },
    },
    RowSpec {
        title: "Comedies",
        media_type: Some(MediaType::Movie),
        feed: Feed::Discover { genre_id: 35 },
    },
    RowSpec {
        title: "Trending Shows",
        media_type: Some(MediaType::Tv),
        feed: Feed::Trending(TrendingScope::Tv),
    },
    RowSpec {
        title: "Top Rated Shows",
        media_type: Some(MediaType::Tv),
        feed: Feed::TopRated(MediaType::Tv),
    },
    RowSpec {
        title: "Documentaries",
        media_type: Some(MediaType::Movie),
        feed: Feed::Discover { genre_id: 99 },
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomePage {
    pub hero: Option<HeroBanner>,
    pub rows: Vec<HomeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroBanner {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub backdrop_url: String,
    /// Overview cut down for the banner.
    pub overview_excerpt: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeRow {
    pub title: String,
    pub media_type: Option<MediaType>,
    pub items: Section<Vec<Card>>,
}

impl PageAggregator {
    pub async fn home(&self, cancel: &CancellationToken) -> Result<HomePage, CatalogError> {
        let feeds = cancellable(cancel, self.home_feeds()).await?;
        let page = self.assemble_home(feeds, &mut rand::rng());
        info!(
            rows_ready = page.rows.iter().filter(|r| r.items.is_ready()).count(),
            hero = page.hero.as_ref().map(|h| h.item.id),
            "home page assembled"
        );
        Ok(page)
    }

    async fn home_feeds(&self) -> Result<Vec<Section<Vec<CatalogItem>>>, CatalogError> {
        let calls = HOME_ROWS.iter().map(|row| self.fetch_feed(row.feed));
        if self.policy == FailurePolicy::FailFast {
            let pages = join_all_or_fail(calls).await?;
            return Ok(pages.into_iter().map(|p| Section::ready(p.results)).collect());
        }

        let results = future::join_all(calls).await;
        // Rows degrade one by one, but a home page with no row at all has failed.
        let all_failed = results.iter().all(Result::is_err);
        let mut feeds = Vec::with_capacity(results.len());
        for (row, result) in HOME_ROWS.iter().zip(results) {
            match result {
                Err(e) if all_failed => return Err(e),
                result => feeds.push(resolve(self.policy, row.title, result.map(|p| p.results))?),
            }
        }
        Ok(feeds)
    }

    fn fetch_feed(&self, feed: Feed) -> BoxedCall<'_, Paged<CatalogItem>> {
        let client = &self.client;
        match feed {
            Feed::Trending(scope) => client.trending(scope, TimeWindow::Week).boxed(),
            Feed::TopRated(kind) => client.top_rated(kind).boxed(),
            Feed::Popular(kind) => client.popular(kind).boxed(),
            Feed::Discover { genre_id } => client.discover_movies(genre_id).boxed(),
        }
    }

    fn assemble_home<R: Rng + ?Sized>(
        &self,
        feeds: Vec<Section<Vec<CatalogItem>>>,
        rng: &mut R,
    ) -> HomePage {
        let hero = feeds
            .first()
            .and_then(Section::data)
            .and_then(|items| pick_hero(items, rng))
            .map(|item| self.hero_banner(item.clone()));
        let rows = HOME_ROWS
            .iter()
            .zip(feeds)
            .map(|(row, items)| HomeRow {
                title: row.title.to_string(),
                media_type: row.media_type,
                items: items.map(|items| self.cards(items)),
            })
            .collect();
        HomePage { hero, rows }
    }

    fn hero_banner(&self, item: CatalogItem) -> HeroBanner {
        HeroBanner {
            backdrop_url: self.hero_url(&item),
            overview_excerpt: display::truncate(&item.overview, HERO_OVERVIEW_CHARS),
            href: format!("/{}/{}", item.media_type.as_path(), item.id),
            item,
        }
    }
}
