use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use super::{http_client, send_json, CoverSource};
use crate::covers::errors::SourceError;
use crate::covers::types::{ComicRaw, RawRecord, SourceKind};

pub const DEFAULT_BASE_URL: &str = "https://comicvine.gamespot.com/api";

const FIELD_LIST: &str = "id,name,issue_number,volume,cover_date,image,site_detail_url";

const STATUS_OK: i64 = 1;
const STATUS_INVALID_API_KEY: i64 = 100;
const STATUS_RATE_LIMITED: i64 = 107;

#[derive(Debug, Deserialize)]
struct IssuesResponse {
    error: String,
    status_code: i64,
    number_of_total_results: Option<u64>,
    #[serde(default)]
    results: Vec<ComicRaw>,
}

/// Comic Vine issues, picked by a random offset into the issue list.
pub struct ComicVineClient {
    http: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
    // upper bound for random offsets; narrowed once the upstream reports its total
    offset_bound: AtomicU64,
}

impl ComicVineClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
        max_random_offset: u64,
    ) -> Result<Self, SourceError> {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            log::warn!("COMIC_VINE_API_KEY not set - comic mode disabled");
        }

        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            offset_bound: AtomicU64::new(max_random_offset.max(1)),
        })
    }

    pub fn offset_bound(&self) -> u64 {
        self.offset_bound.load(Ordering::Relaxed)
    }

    fn random_offset(&self) -> u64 {
        rand::rng().random_range(0..self.offset_bound())
    }

    fn observe_total(&self, total: u64) {
        if total > 0 {
            self.offset_bound.fetch_min(total, Ordering::Relaxed);
        }
    }

    fn handle_response(&self, resp: IssuesResponse, offset: u64) -> Result<Option<RawRecord>, SourceError> {
        if resp.status_code != STATUS_OK || resp.error != "OK" {
            log::error!(
                "comic vine api error: status_code={} error={}",
                resp.status_code,
                resp.error
            );
            return Err(SourceError::ApiRejected {
                code: resp.status_code,
                message: resp.error,
                retryable: resp.status_code == STATUS_RATE_LIMITED,
            });
        }

        if let Some(total) = resp.number_of_total_results {
            self.observe_total(total);
        }

        match resp.results.into_iter().next() {
            Some(issue) => Ok(Some(RawRecord::Comic(issue))),
            None => {
                log::warn!("no results found at offset {offset}");
                Ok(None)
            }
        }
    }
}

impl CoverSource for ComicVineClient {
    fn fetch_random_candidate(&self) -> Result<Option<RawRecord>, SourceError> {
        self.ensure_configured()?;
        let api_key = self.api_key.as_deref().unwrap_or_default();

        let offset = self.random_offset();
        let offset_param = offset.to_string();
        log::debug!("comic vine: requesting issue at offset {offset}");

        let request = self
            .http
            .get(format!("{}/issues/", self.base_url))
            .query(&[
                ("api_key", api_key),
                ("format", "json"),
                ("limit", "1"),
                ("offset", offset_param.as_str()),
                ("field_list", FIELD_LIST),
            ]);

        let resp: IssuesResponse = send_json(self.name(), request)?;
        self.handle_response(resp, offset)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Comic
    }

    fn name(&self) -> &'static str {
        "ComicVine"
    }

    fn ensure_configured(&self) -> Result<(), SourceError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(SourceError::MisconfiguredSource(SourceKind::Comic)),
        }
    }
}
