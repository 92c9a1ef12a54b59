//! Picks that reduce catalog lists to the single value a view needs.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::catalog::models::{Season, Video};

/// The only site the embedded player can play.
pub const PLAYABLE_SITE: &str = "YouTube";
pub const MOVIE_TRAILER_KINDS: &[&str] = &["Trailer"];
pub const SHOW_TRAILER_KINDS: &[&str] = &["Trailer", "Teaser"];

/// First playable video, in list order, whose type is one of `kinds`.
pub fn select_trailer<'a>(videos: &'a [Video], kinds: &[&str]) -> Option<&'a Video> {
    videos
        .iter()
        .find(|v| v.site == PLAYABLE_SITE && kinds.contains(&v.kind.as_str()))
}

/// Season a show page opens on: the one numbered like the show's season
/// count, else the first listed season, else season 1. Season 0 never counts.
pub fn latest_season_number(number_of_seasons: u32, seasons: &[Season]) -> u32 {
    seasons
        .iter()
        .find(|s| s.season_number == number_of_seasons)
        .map(|s| s.season_number)
        .filter(|n| *n > 0)
        .or_else(|| {
            seasons
                .first()
                .map(|s| s.season_number)
                .filter(|n| *n > 0)
        })
        .unwrap_or(1)
}

/// Seasons as listed to the viewer: specials dropped, order kept.
pub fn displayable_seasons(seasons: &[Season]) -> impl Iterator<Item = &Season> {
    seasons.iter().filter(|s| s.season_number > 0)
}

pub fn pick_hero<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}
