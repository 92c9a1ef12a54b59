use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::select::{
    displayable_seasons, latest_season_number, select_trailer, SHOW_TRAILER_KINDS,
};
use super::{cancellable, settle, Card, PageAggregator, ReviewCard, Section, Trailer};
use crate::catalog::images::PLACEHOLDER_EPISODE;
use crate::catalog::models::{CastMember, Episode, Season, SeasonDetails, ShowDetails};
use crate::catalog::{CatalogError, ImageSize};
use crate::display;

const SEASON_CAST: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowPage {
    pub details: ShowDetails,
    pub backdrop_url: String,
    pub poster_url: String,
    pub year: Option<String>,
    pub match_percent: u8,
    pub genres: String,
    pub seasons_label: String,
    pub episode_runtime: Option<String>,
    pub trailer: Section<Option<Trailer>>,
    pub reviews: Section<Vec<ReviewCard>>,
    pub latest_season: Section<SeasonView>,
    /// Regular seasons in listing order, specials left out.
    pub seasons: Vec<SeasonCard>,
    pub similar: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonView {
    pub show_id: u64,
    pub season_number: u32,
    pub name: Option<String>,
    pub overview: String,
    pub air_date: Option<String>,
    pub year: Option<String>,
    pub poster_url: String,
    pub episodes: Vec<EpisodeCard>,
    pub trailer: Option<Trailer>,
    pub cast: Vec<CastMember>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeCard {
    #[serde(flatten)]
    pub episode: Episode,
    pub still_url: String,
    pub year: Option<String>,
    pub runtime_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonCard {
    #[serde(flatten)]
    pub season: Season,
    pub poster_url: String,
}

impl PageAggregator {
    pub async fn show(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<ShowPage, CatalogError> {
        cancellable(cancel, self.show_page(id)).await
    }

    /// A single season on its own, without the show around it.
    pub async fn season(
        &self,
        show_id: u64,
        season_number: u32,
        cancel: &CancellationToken,
    ) -> Result<SeasonView, CatalogError> {
        let details = cancellable(cancel, self.client.season_details(show_id, season_number)).await?;
        Ok(self.season_view(show_id, details, None))
    }

    async fn show_page(&self, id: u64) -> Result<ShowPage, CatalogError> {
        let (details, videos, reviews) = tokio::try_join!(
            self.client.show_details(id),
            settle(self.policy, "videos", self.client.show_videos(id)),
            settle(self.policy, "reviews", self.client.show_reviews(id)),
        )?;

        // Needs the season list, so it cannot join the batch above.
        let season_number = latest_season_number(details.number_of_seasons, &details.seasons);
        debug!(show_id = id, season_number, "fetching latest season");
        let show_poster = details.item.poster_path.as_deref();
        let latest_season = settle(
            self.policy,
            "latest_season",
            self.client.season_details(id, season_number),
        )
        .await?
        .map(|season| self.season_view(id, season, show_poster));

        let trailer = videos
            .or_else_ready(details.videos.clone())
            .map(|v| select_trailer(&v.results, SHOW_TRAILER_KINDS).map(Trailer::from));
        let reviews = reviews
            .or_else_ready(details.reviews.clone())
            .map(|p| p.results.into_iter().map(ReviewCard::from).collect());
        let seasons = displayable_seasons(&details.seasons)
            .map(|season| SeasonCard {
                poster_url: self.client.image_url(
                    season.poster_path.as_deref().or(show_poster),
                    ImageSize::W500,
                ),
                season: season.clone(),
            })
            .collect();

        let item = &details.item;
        let page = ShowPage {
            backdrop_url: self.hero_url(item),
            poster_url: self.client.image_url(show_poster, ImageSize::W500),
            year: display::release_year(item.date()),
            match_percent: display::match_percent(item.vote_average),
            genres: display::genre_label(&details.genres),
            seasons_label: display::seasons_label(details.number_of_seasons),
            episode_runtime: details
                .episode_run_time
                .first()
                .filter(|m| **m > 0)
                .map(|m| format!("{m}m")),
            similar: self.similar_cards(details.similar.as_ref()),
            trailer,
            reviews,
            latest_season,
            seasons,
            details,
        };
        info!(
            show_id = id,
            title = %page.details.item.title,
            latest_season = season_number,
            "show page assembled"
        );
        Ok(page)
    }

    fn season_view(
        &self,
        show_id: u64,
        season: SeasonDetails,
        fallback_poster: Option<&str>,
    ) -> SeasonView {
        let trailer = season
            .videos
            .as_ref()
            .and_then(|v| select_trailer(&v.results, SHOW_TRAILER_KINDS))
            .map(Trailer::from);
        let cast = season
            .credits
            .as_ref()
            .map(|c| c.cast.iter().take(SEASON_CAST).cloned().collect())
            .unwrap_or_default();
        let episodes = season
            .episodes
            .into_iter()
            .map(|episode| EpisodeCard {
                still_url: self.client.image_url_or(
                    episode.still_path.as_deref(),
                    ImageSize::W500,
                    PLACEHOLDER_EPISODE,
                ),
                year: display::release_year(episode.air_date.as_deref()),
                runtime_label: display::episode_runtime_label(episode.runtime),
                episode,
            })
            .collect();
        SeasonView {
            show_id,
            season_number: season.season_number,
            year: display::release_year(season.air_date.as_deref()),
            poster_url: self.client.image_url(
                season.poster_path.as_deref().or(fallback_poster),
                ImageSize::W500,
            ),
            name: season.name,
            overview: season.overview,
            air_date: season.air_date,
            episodes,
            trailer,
            cast,
            imdb_id: season.external_ids.and_then(|ids| ids.imdb_id),
        }
    }
}
