//! URLs into the image CDN and the video host's thumbnail service.
//! Nothing here touches the network.

use serde::Serialize;

pub const PLACEHOLDER_IMAGE: &str = "/no-image.jpg";
pub const PLACEHOLDER_EPISODE: &str = "/placeholder-episode.jpg";

const YOUTUBE_THUMB_BASE: &str = "https://img.youtube.com/vi";
const YOUTUBE_WATCH_BASE: &str = "https://www.youtube.com/watch?v=";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ImageSize {
    #[default]
    W500,
    Original,
}

impl ImageSize {
    pub fn token(&self) -> &'static str {
        match self {
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThumbnailQuality {
    Default,
    Medium,
    #[default]
    High,
    Standard,
    Max,
}

impl ThumbnailQuality {
    pub fn token(&self) -> &'static str {
        match self {
            ThumbnailQuality::Default => "default",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::Max => "maxresdefault",
        }
    }
}

/// `<base><size><path>`, or [`PLACEHOLDER_IMAGE`] when there is no path.
pub fn image_url(base: &str, path: Option<&str>, size: ImageSize) -> String {
    image_url_or(base, path, size, PLACEHOLDER_IMAGE)
}

pub fn image_url_or(base: &str, path: Option<&str>, size: ImageSize, placeholder: &str) -> String {
    match path {
        Some(p) if !p.is_empty() => format!("{base}{}{p}", size.token()),
        _ => placeholder.to_string(),
    }
}

pub fn youtube_thumbnail(key: &str, quality: ThumbnailQuality) -> String {
    format!("{YOUTUBE_THUMB_BASE}/{key}/{}.jpg", quality.token())
}

pub fn youtube_watch_url(key: &str) -> String {
    format!("{YOUTUBE_WATCH_BASE}{key}")
}
