use std::time::Duration;

use super::errors::SourceError;
use super::normalize::{cover_image, normalize};
use super::sources::CoverSource;
use super::types::{CanonicalCover, RawRecord};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause after a retryable upstream failure; doubled when rate limited.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Terminal outcome of a discovery run. Running out of attempts is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    Found(CanonicalCover),
    NotFound,
}

/// Why an attempt did not produce a cover.
#[derive(Debug)]
enum Skip {
    Empty,
    NoImage,
    Failed(SourceError),
}

#[derive(Debug)]
enum Attempt {
    Continue(Skip),
    Abort(SourceError),
    Found(CanonicalCover),
}

/// Query `source` until it yields a record with a usable cover, at most `policy.max_attempts` times.
pub fn find_random_cover_item(
    source: &dyn CoverSource,
    policy: &RetryPolicy,
) -> Result<Discovery, SourceError> {
    find_with(source, policy, normalize)
}

/// Same as [`find_random_cover_item`] with the normalizer supplied by the caller.
pub fn find_with<F>(
    source: &dyn CoverSource,
    policy: &RetryPolicy,
    normalizer: F,
) -> Result<Discovery, SourceError>
where
    F: Fn(&RawRecord) -> CanonicalCover,
{
    source.ensure_configured()?;

    let kind = source.kind();
    let (mut empty, mut no_image, mut failed) = (0u32, 0u32, 0u32);

    for attempt_no in 1..=policy.max_attempts {
        match attempt(source, &normalizer) {
            Attempt::Found(cover) => {
                match cover.year {
                    Some(year) => log::info!("Found valid {kind}: {} from {year}", cover.title),
                    None => log::info!("Found valid {kind}: {}", cover.title),
                }
                return Ok(Discovery::Found(cover));
            }
            Attempt::Abort(err) => {
                log::error!(
                    "source={} attempt {attempt_no}/{} failed, giving up: {err}",
                    source.name(),
                    policy.max_attempts
                );
                return Err(err);
            }
            Attempt::Continue(Skip::Empty) => {
                empty += 1;
                log::debug!("no {kind} found");
            }
            Attempt::Continue(Skip::NoImage) => no_image += 1,
            Attempt::Continue(Skip::Failed(err)) => {
                failed += 1;
                log::warn!(
                    "source={} attempt {attempt_no}/{} failed: {err}",
                    source.name(),
                    policy.max_attempts
                );
                if attempt_no < policy.max_attempts {
                    backoff(policy, &err);
                }
            }
        }
    }

    log::warn!(
        "Could not find valid {kind} after {} attempts (empty={empty} no_image={no_image} failed={failed})",
        policy.max_attempts
    );
    Ok(Discovery::NotFound)
}

fn attempt<F>(source: &dyn CoverSource, normalizer: &F) -> Attempt
where
    F: Fn(&RawRecord) -> CanonicalCover,
{
    match source.fetch_random_candidate() {
        Ok(None) => Attempt::Continue(Skip::Empty),
        Ok(Some(raw)) => match cover_image(&raw) {
            Some(_) => Attempt::Found(normalizer(&raw)),
            None => {
                log::debug!("skipping {} with invalid image", raw.kind());
                Attempt::Continue(Skip::NoImage)
            }
        },
        Err(err) if err.is_retryable() => Attempt::Continue(Skip::Failed(err)),
        Err(err) => Attempt::Abort(err),
    }
}

fn backoff(policy: &RetryPolicy, err: &SourceError) {
    let delay = if err.is_rate_limit() {
        policy.backoff * 2
    } else {
        policy.backoff
    };
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
