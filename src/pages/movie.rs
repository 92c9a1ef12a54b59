use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::select::{select_trailer, MOVIE_TRAILER_KINDS};
use super::{cancellable, settle, Card, PageAggregator, ReviewCard, Section, Trailer};
use crate::catalog::models::MovieDetails;
use crate::catalog::{CatalogError, ImageSize};
use crate::display;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoviePage {
    pub details: MovieDetails,
    pub backdrop_url: String,
    pub poster_url: String,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub match_percent: u8,
    pub genres: String,
    pub budget: Option<String>,
    /// `Ready` with `None` means the movie has no playable trailer.
    pub trailer: Section<Option<Trailer>>,
    pub reviews: Section<Vec<ReviewCard>>,
    pub similar: Vec<Card>,
}

impl PageAggregator {
    pub async fn movie(
        &self,
        id: u64,
        cancel: &CancellationToken,
    ) -> Result<MoviePage, CatalogError> {
        cancellable(cancel, self.movie_page(id)).await
    }

    async fn movie_page(&self, id: u64) -> Result<MoviePage, CatalogError> {
        let (details, videos, reviews) = tokio::try_join!(
            self.client.movie_details(id),
            settle(self.policy, "videos", self.client.movie_videos(id)),
            settle(self.policy, "reviews", self.client.movie_reviews(id)),
        )?;

        // Details already carry appended videos and reviews; use them when the
        // dedicated calls failed.
        let trailer = videos
            .or_else_ready(details.videos.clone())
            .map(|v| select_trailer(&v.results, MOVIE_TRAILER_KINDS).map(Trailer::from));
        let reviews = reviews
            .or_else_ready(details.reviews.clone())
            .map(|p| p.results.into_iter().map(ReviewCard::from).collect());

        let item = &details.item;
        let page = MoviePage {
            backdrop_url: self.hero_url(item),
            poster_url: self
                .client
                .image_url(item.poster_path.as_deref(), ImageSize::W500),
            year: display::release_year(item.date()),
            runtime: display::runtime_label(details.runtime),
            match_percent: display::match_percent(item.vote_average),
            genres: display::genre_label(&details.genres),
            budget: display::budget_label(details.budget),
            similar: self.similar_cards(details.similar.as_ref()),
            trailer,
            reviews,
            details,
        };
        info!(
            movie_id = id,
            title = %page.details.item.title,
            trailer = page.trailer.data().map(|t| t.is_some()),
            "movie page assembled"
        );
        Ok(page)
    }
}
