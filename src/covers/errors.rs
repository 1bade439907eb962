use super::types::SourceKind;

/// Failures a cover source can report for a single attempt.
///
/// Whether an error is worth another attempt is decided by [`SourceError::is_retryable`];
/// the discovery loop owns that decision, sources never retry on their own.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("{0} mode is not configured")]
    MisconfiguredSource(SourceKind),

    #[error("upstream returned http status {status}")]
    UpstreamUnavailable { status: u16 },

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream connection failed: {0}")]
    Transport(String),

    #[error("upstream rejected the request (code {code}): {message}")]
    ApiRejected {
        code: i64,
        message: String,
        retryable: bool,
    },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

// Comic Vine uses 420 for rate limiting; everyone else uses 429.
const RATE_LIMIT_STATUSES: [u16; 2] = [420, 429];

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::UpstreamUnavailable { status } => {
                RATE_LIMIT_STATUSES.contains(status) || *status == 408 || (500..600).contains(status)
            }
            SourceError::UpstreamTimeout | SourceError::Transport(_) => true,
            SourceError::ApiRejected { retryable, .. } => *retryable,
            SourceError::MisconfiguredSource(_) | SourceError::InvalidResponse(_) => false,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        match self {
            SourceError::UpstreamUnavailable { status } => RATE_LIMIT_STATUSES.contains(status),
            SourceError::ApiRejected { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::UpstreamTimeout
        } else if let Some(status) = err.status() {
            SourceError::UpstreamUnavailable {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            SourceError::InvalidResponse(err.to_string())
        } else {
            SourceError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::InvalidResponse(err.to_string())
    }
}
