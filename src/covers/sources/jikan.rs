use std::time::Duration;

use serde::Deserialize;

use super::{http_client, send_json, CoverSource};
use crate::covers::errors::SourceError;
use crate::covers::types::{AnimeRaw, RawRecord, SourceKind};

pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct RandomAnimeResponse {
    data: Option<AnimeRaw>,
}

/// Jikan (MyAnimeList) random anime. No credential, native randomization.
pub struct JikanClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl JikanClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
        })
    }

    fn handle_response(resp: RandomAnimeResponse) -> Option<RawRecord> {
        match resp.data {
            Some(anime) => Some(RawRecord::Anime(anime)),
            None => {
                log::warn!("no anime data in response");
                None
            }
        }
    }
}

impl CoverSource for JikanClient {
    fn fetch_random_candidate(&self) -> Result<Option<RawRecord>, SourceError> {
        let request = self.http.get(format!("{}/random/anime", self.base_url));
        let resp: RandomAnimeResponse = send_json(self.name(), request)?;
        Ok(Self::handle_response(resp))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Anime
    }

    fn name(&self) -> &'static str {
        "Jikan"
    }
}
