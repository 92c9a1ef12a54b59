//! Small string helpers that turn catalog values into what the views print.

use crate::catalog::models::Genre;

/// Cuts `text` to fit `max` characters, ending in `...` when anything was cut.
///
/// Counts `char`s, not grapheme clusters, so combining sequences can be split.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push_str("...");
    out
}

/// Leading four characters of an ISO date.
pub fn release_year(date: Option<&str>) -> Option<String> {
    let year: String = date?.chars().take(4).collect();
    if year.is_empty() {
        None
    } else {
        Some(year)
    }
}

pub fn runtime_label(minutes: Option<u32>) -> Option<String> {
    match minutes {
        Some(m) if m > 0 => Some(format!("{}h {}m", m / 60, m % 60)),
        _ => None,
    }
}

pub fn episode_runtime_label(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{m}m"),
        _ => "--m".to_string(),
    }
}

/// Vote average as the "% Match" shown next to a title.
pub fn match_percent(vote_average: f64) -> u8 {
    (vote_average * 10.0).round().clamp(0.0, 100.0) as u8
}

pub fn genre_label(genres: &[Genre]) -> String {
    genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn budget_label(budget: u64) -> Option<String> {
    if budget == 0 {
        return None;
    }
    let digits = budget.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    Some(out)
}

pub fn seasons_label(count: u32) -> String {
    if count == 1 {
        "1 Season".to_string()
    } else {
        format!("{count} Seasons")
    }
}

/// One star per two rating points, plus a half star for an odd rating.
pub fn review_stars(rating: u8) -> String {
    let mut stars = "★".repeat(usize::from(rating / 2));
    if rating % 2 == 1 {
        stars.push('½');
    }
    stars
}
