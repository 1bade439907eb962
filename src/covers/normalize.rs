use chrono::{DateTime, Datelike, NaiveDate};

use super::types::{AnimeRaw, CanonicalCover, ComicRaw, CoverLink, RawRecord};

const UNKNOWN_SERIES: &str = "Unknown Series";
const UNKNOWN_ANIME: &str = "Unknown Anime";

/// Returns the cover image a record would be normalized with, if it has a usable one.
///
/// This is the validity check the discovery loop runs before normalizing.
pub fn cover_image(raw: &RawRecord) -> Option<&str> {
    match raw {
        RawRecord::Comic(comic) => comic_cover(comic),
        RawRecord::Anime(anime) => anime_cover(anime),
    }
}

/// Maps a raw upstream record into the canonical shape.
///
/// Pure and infallible: missing optional fields become empty or `None`.
pub fn normalize(raw: &RawRecord) -> CanonicalCover {
    match raw {
        RawRecord::Comic(comic) => normalize_comic(comic),
        RawRecord::Anime(anime) => normalize_anime(anime),
    }
}

fn normalize_comic(comic: &ComicRaw) -> CanonicalCover {
    CanonicalCover {
        title: comic_title(comic),
        cover_url: comic_cover(comic).unwrap_or_default().to_string(),
        urls: detail_links(comic.site_detail_url.as_deref()),
        year: comic.cover_date.as_deref().and_then(year_from_date),
    }
}

fn normalize_anime(anime: &AnimeRaw) -> CanonicalCover {
    CanonicalCover {
        title: anime_title(anime),
        cover_url: anime_cover(anime).unwrap_or_default().to_string(),
        urls: detail_links(anime.url.as_deref()),
        year: anime_year(anime),
    }
}

/// "Series #12 - Issue Title", dropping whichever parts are blank.
pub fn comic_title(comic: &ComicRaw) -> String {
    let series = comic
        .volume
        .as_ref()
        .and_then(|volume| non_empty(volume.name.as_deref()))
        .unwrap_or(UNKNOWN_SERIES);

    let mut title = series.to_string();
    if let Some(number) = non_empty(comic.issue_number.as_deref()) {
        title.push_str(&format!(" #{number}"));
    }
    if let Some(name) = non_empty(comic.name.as_deref()) {
        title.push_str(&format!(" - {name}"));
    }
    title
}

pub fn anime_title(anime: &AnimeRaw) -> String {
    non_empty(anime.title_english.as_deref())
        .or_else(|| non_empty(anime.title.as_deref()))
        .unwrap_or(UNKNOWN_ANIME)
        .to_string()
}

fn comic_cover(comic: &ComicRaw) -> Option<&str> {
    let image = comic.image.as_ref()?;
    [
        &image.medium_url,
        &image.screen_large_url,
        &image.small_url,
        &image.super_url,
        &image.original_url,
    ]
    .into_iter()
    .find_map(|url| non_empty(url.as_deref()))
}

fn anime_cover(anime: &AnimeRaw) -> Option<&str> {
    let images = anime.images.as_ref()?;
    [&images.jpg, &images.webp]
        .into_iter()
        .flatten()
        .flat_map(|set| [&set.large_image_url, &set.image_url])
        .find_map(|url| non_empty(url.as_deref()))
}

fn anime_year(anime: &AnimeRaw) -> Option<i32> {
    anime.year.filter(|year| *year > 0).or_else(|| {
        anime
            .aired
            .as_ref()
            .and_then(|aired| aired.from.as_deref())
            .and_then(year_from_date)
    })
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, or anything starting with a four digit year.
pub fn year_from_date(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.year());
    }

    let prefix = value.split('-').next()?;
    if prefix.len() != 4 {
        log::debug!("could not parse year from date: {value:?}");
        return None;
    }
    prefix.parse().ok()
}

fn detail_links(url: Option<&str>) -> Vec<CoverLink> {
    non_empty(url).map(CoverLink::detail).into_iter().collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
