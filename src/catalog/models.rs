//! Typed records for catalog responses.
//!
//! Everything is parsed at the client boundary, so a missing required field
//! shows up as a parse error instead of an empty value in a view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// A movie or a show as it appears in lists and at the top of detail records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalogItem")]
pub struct CatalogItem {
    pub id: u64,
    /// Movie title or show name, whichever the catalog populated.
    pub title: String,
    pub original_name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub media_type: MediaType,
    pub genre_ids: Vec<u32>,
    pub popularity: Option<f64>,
    pub vote_count: Option<u64>,
}

impl CatalogItem {
    /// Release date for movies, first air date for shows.
    pub fn date(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
    }

    /// Backdrop when present, poster otherwise.
    pub fn hero_image_path(&self) -> Option<&str> {
        self.backdrop_path
            .as_deref()
            .or(self.poster_path.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCatalogItem {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    original_name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    vote_average: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    media_type: Option<MediaType>,
    #[serde(default)]
    genre_ids: Vec<u32>,
    popularity: Option<f64>,
    vote_count: Option<u64>,
}

impl RawCatalogItem {
    fn into_item(self, media_type: Option<MediaType>) -> Result<CatalogItem, String> {
        let inferred = if self.title.is_some() {
            MediaType::Movie
        } else {
            MediaType::Tv
        };
        let media_type = media_type.or(self.media_type).unwrap_or(inferred);
        let title = self
            .title
            .or(self.name)
            .ok_or_else(|| format!("catalog item {} has neither title nor name", self.id))?;
        Ok(CatalogItem {
            id: self.id,
            title,
            original_name: self.original_name,
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            overview: self.overview.unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or_default(),
            release_date: non_empty(self.release_date),
            first_air_date: non_empty(self.first_air_date),
            media_type,
            genre_ids: self.genre_ids,
            popularity: self.popularity,
            vote_count: self.vote_count,
        })
    }
}

impl TryFrom<RawCatalogItem> for CatalogItem {
    type Error = String;

    fn try_from(raw: RawCatalogItem) -> Result<Self, Self::Error> {
        raw.into_item(None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Entry of a mixed trending feed. People are dropped, they have no detail page.
#[derive(Debug, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub(crate) enum TrendingEntry {
    Movie(RawCatalogItem),
    Tv(RawCatalogItem),
    #[serde(other)]
    Other,
}

impl TrendingEntry {
    pub(crate) fn into_item(self) -> Option<Result<CatalogItem, String>> {
        match self {
            TrendingEntry::Movie(raw) => Some(raw.into_item(Some(MediaType::Movie))),
            TrendingEntry::Tv(raw) => Some(raw.into_item(Some(MediaType::Tv))),
            TrendingEntry::Other => None,
        }
    }
}

/// The list envelope every catalog list endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    pub tagline: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub credits: Option<Credits>,
    pub videos: Option<VideoList>,
    pub similar: Option<Paged<CatalogItem>>,
    pub reviews: Option<Paged<Review>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetails {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(default)]
    pub number_of_seasons: u32,
    #[serde(default)]
    pub number_of_episodes: u32,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub created_by: Vec<Creator>,
    #[serde(default)]
    pub networks: Vec<Network>,
    pub credits: Option<Credits>,
    pub videos: Option<VideoList>,
    pub similar: Option<Paged<CatalogItem>>,
    pub reviews: Option<Paged<Review>>,
    pub content_ratings: Option<ContentRatings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: u64,
    pub name: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: u64,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRatings {
    #[serde(default)]
    pub results: Vec<ContentRating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRating {
    pub iso_3166_1: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub season_number: u32,
    #[serde(default)]
    pub episode_count: u32,
    pub poster_path: Option<String>,
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetails {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(default)]
    pub overview: String,
    pub season_number: u32,
    pub poster_path: Option<String>,
    pub air_date: Option<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    pub credits: Option<Credits>,
    pub videos: Option<VideoList>,
    pub images: Option<SeasonImages>,
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(default)]
    pub overview: String,
    pub episode_number: u32,
    pub still_path: Option<String>,
    pub runtime: Option<u32>,
    pub air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonImages {
    #[serde(default)]
    pub posters: Vec<ImageFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub file_path: String,
    pub iso_639_1: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
    pub wikidata_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: Option<String>,
    /// Opaque id understood by the hosting site's player.
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawReview")]
pub struct Review {
    pub id: Option<String>,
    pub author: String,
    pub content: String,
    /// Author supplied score out of 10.
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    id: Option<String>,
    author: String,
    #[serde(default)]
    content: String,
    author_details: Option<AuthorDetails>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AuthorDetails {
    rating: Option<f64>,
}

impl From<RawReview> for Review {
    fn from(raw: RawReview) -> Self {
        let rating = raw
            .author_details
            .and_then(|d| d.rating)
            .map(|r| r.round().clamp(0.0, 10.0) as u8);
        Review {
            id: raw.id,
            author: raw.author,
            content: raw.content,
            rating,
            created_at: raw.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_media_type_from_title_field() {
        let movie: CatalogItem =
            serde_json::from_value(json!({"id": 1, "title": "Heat", "overview": "x"})).unwrap();
        assert_eq!(movie.media_type, MediaType::Movie);
        assert_eq!(movie.title, "Heat");

        let show: CatalogItem =
            serde_json::from_value(json!({"id": 2, "name": "Severance"})).unwrap();
        assert_eq!(show.media_type, MediaType::Tv);
        assert_eq!(show.title, "Severance");
        assert_eq!(show.overview, "");
    }

    #[test]
    fn explicit_media_type_wins() {
        let item: CatalogItem = serde_json::from_value(
            json!({"id": 3, "name": "Odd", "media_type": "movie", "release_date": ""}),
        )
        .unwrap();
        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(item.release_date, None);
    }

    #[test]
    fn item_without_any_title_is_rejected() {
        let err = serde_json::from_value::<CatalogItem>(json!({"id": 4})).unwrap_err();
        assert!(err.to_string().contains("neither title nor name"));
    }

    #[test]
    fn trending_feed_drops_people() {
        let entries: Vec<TrendingEntry> = serde_json::from_value(json!([
            {"media_type": "movie", "id": 1, "title": "A"},
            {"media_type": "person", "id": 2, "name": "Someone"},
            {"media_type": "tv", "id": 3, "name": "B"}
        ]))
        .unwrap();
        let items: Vec<CatalogItem> = entries
            .into_iter()
            .filter_map(TrendingEntry::into_item)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].media_type, MediaType::Tv);
    }

    #[test]
    fn movie_details_flatten_the_item() {
        let details: MovieDetails = serde_json::from_value(json!({
            "id": 550,
            "title": "Fight Club",
            "runtime": 139,
            "budget": 63000000,
            "genres": [{"id": 18, "name": "Drama"}],
            "videos": {"results": [{"key": "abc", "site": "YouTube", "type": "Trailer"}]}
        }))
        .unwrap();
        assert_eq!(details.item.id, 550);
        assert_eq!(details.runtime, Some(139));
        assert_eq!(details.genres[0].name, "Drama");
        assert_eq!(details.videos.unwrap().results[0].kind, "Trailer");
        assert!(details.similar.is_none());
    }

    #[test]
    fn review_rating_is_rounded_and_optional() {
        let reviews: Vec<Review> = serde_json::from_value(json!([
            {"author": "a", "content": "good", "author_details": {"rating": 7.6},
             "created_at": "2023-01-20T12:34:56.789Z"},
            {"author": "b", "author_details": {"rating": null},
             "created_at": "2023-01-21T00:00:00Z"}
        ]))
        .unwrap();
        assert_eq!(reviews[0].rating, Some(8));
        assert_eq!(reviews[1].rating, None);
        assert_eq!(reviews[1].content, "");
    }
}
