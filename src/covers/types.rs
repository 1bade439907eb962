use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Which upstream catalog a request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Comic,
    Anime,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Comic => "comic",
            SourceKind::Anime => "anime",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl CoverLink {
    pub fn detail(url: impl Into<String>) -> Self {
        Self {
            kind: "detail".to_string(),
            url: url.into(),
        }
    }
}

/// The source-independent record served to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCover {
    pub title: String,
    pub cover_url: String,
    pub urls: Vec<CoverLink>,
    pub year: Option<i32>,
}

impl CanonicalCover {
    pub fn detail_url(&self) -> Option<&str> {
        self.urls
            .iter()
            .find(|link| link.kind == "detail")
            .map(|link| link.url.as_str())
    }
}

/// One candidate as returned by an upstream, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Comic(ComicRaw),
    Anime(AnimeRaw),
}

impl RawRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            RawRecord::Comic(_) => SourceKind::Comic,
            RawRecord::Anime(_) => SourceKind::Anime,
        }
    }
}

// Comic Vine issue, trimmed to the requested field_list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComicRaw {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub issue_number: Option<String>,
    pub volume: Option<ComicVolume>,
    pub cover_date: Option<String>,
    pub image: Option<ComicImage>,
    pub site_detail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComicVolume {
    pub id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComicImage {
    pub medium_url: Option<String>,
    pub screen_large_url: Option<String>,
    pub small_url: Option<String>,
    pub super_url: Option<String>,
    pub original_url: Option<String>,
}

// Jikan anime entry; only the fields used for covers are modelled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnimeRaw {
    pub mal_id: Option<u64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub title_english: Option<String>,
    pub images: Option<AnimeImages>,
    pub year: Option<i32>,
    pub aired: Option<AnimeAired>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnimeImages {
    pub jpg: Option<AnimeImageSet>,
    pub webp: Option<AnimeImageSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnimeImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnimeAired {
    pub from: Option<String>,
}

/// Comic Vine sends `issue_number` as a string, but older records carry plain numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
