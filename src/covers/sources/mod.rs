pub mod comicvine;
pub mod jikan;

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::errors::SourceError;
use super::types::{RawRecord, SourceKind};

pub use comicvine::ComicVineClient;
pub use jikan::JikanClient;

const USER_AGENT: &str = "Cover Generator/1.0";

/// An upstream catalog that can hand out one random candidate per call.
///
/// Implementations make exactly one outbound request per `fetch_random_candidate`
/// and never retry internally.
pub trait CoverSource: Send + Sync {
    /// Fetch one random candidate. `Ok(None)` means the upstream answered but had nothing.
    fn fetch_random_candidate(&self) -> Result<Option<RawRecord>, SourceError>;

    fn kind(&self) -> SourceKind;

    /// Get the name of this source for logging
    fn name(&self) -> &'static str;

    /// Checked before any discovery starts, so an unconfigured source never calls out.
    fn ensure_configured(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, SourceError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| SourceError::Transport(format!("failed to build http client: {err}")))
}

/// Send a request and decode its JSON body, mapping transport and status failures.
///
/// Error bodies are logged and dropped.
pub fn send_json<T>(source: &str, request: reqwest::blocking::RequestBuilder) -> Result<T, SourceError>
where
    T: DeserializeOwned,
{
    let response = request.send().map_err(|err| {
        let err = SourceError::from(err);
        log::warn!("source={source} request failed: {err}");
        err
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        log::error!("source={source} http status={status} body={}", truncate(&body, 500));
        return Err(SourceError::UpstreamUnavailable {
            status: status.as_u16(),
        });
    }

    let text = response.text()?;
    serde_json::from_str::<T>(&text).map_err(|err| {
        log::error!("source={source} {err}. tried to parse: {}", truncate(&text, 500));
        err.into()
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
