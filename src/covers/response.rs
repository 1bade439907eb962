use axum::http::StatusCode;
use serde::Serialize;

use super::discovery::Discovery;
use super::errors::SourceError;
use super::types::{CanonicalCover, SourceKind};

/// Body of `/random-comic` and `/random-anime`.
///
/// The record is always under `comic`, whichever source produced it, so one
/// frontend renderer handles both modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoverResponse {
    Found {
        year: Option<i32>,
        comic: CanonicalCover,
    },
    NotFound {
        comic: Option<CanonicalCover>,
    },
}

impl From<Discovery> for CoverResponse {
    fn from(discovery: Discovery) -> Self {
        match discovery {
            Discovery::Found(cover) => CoverResponse::Found {
                year: cover.year,
                comic: cover,
            },
            Discovery::NotFound => CoverResponse::NotFound { comic: None },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Status and client-safe body for a hard failure. Upstream details stay in the logs.
    ///
    /// Only non-retryable errors get here; timeouts end a discovery as not found.
    pub fn from_source_error(err: &SourceError, kind: SourceKind) -> (StatusCode, Self) {
        match err {
            SourceError::MisconfiguredSource(kind) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Self::new(
                    "source_unavailable",
                    match kind {
                        SourceKind::Comic => {
                            "Comic mode not available: COMIC_VINE_API_KEY is not configured.".to_string()
                        }
                        SourceKind::Anime => "Anime mode not available.".to_string(),
                    },
                ),
            ),
            _ => (
                StatusCode::BAD_GATEWAY,
                Self::new(
                    "upstream_error",
                    format!("An error occurred while fetching the {kind}. Please try again later."),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covers::types::CoverLink;
    use serde_json::json;

    fn cover(year: Option<i32>) -> CanonicalCover {
        CanonicalCover {
            title: "Demon Slayer".into(),
            cover_url: "https://cdn.example/large.jpg".into(),
            urls: vec![CoverLink::detail("https://myanimelist.net/anime/38000")],
            year,
        }
    }

    #[test]
    fn test_found_shape() {
        let body = serde_json::to_value(CoverResponse::from(Discovery::Found(cover(Some(2019))))).unwrap();
        assert_eq!(
            body,
            json!({
                "year": 2019,
                "comic": {
                    "title": "Demon Slayer",
                    "coverUrl": "https://cdn.example/large.jpg",
                    "urls": [{"type": "detail", "url": "https://myanimelist.net/anime/38000"}],
                    "year": 2019
                }
            })
        );
    }

    #[test]
    fn test_found_without_year_keeps_null() {
        let body = serde_json::to_value(CoverResponse::from(Discovery::Found(cover(None)))).unwrap();
        assert!(body["year"].is_null());
        assert_eq!(body["comic"]["title"], "Demon Slayer");
    }

    #[test]
    fn test_not_found_shape() {
        let body = serde_json::to_value(CoverResponse::from(Discovery::NotFound)).unwrap();
        assert_eq!(body, json!({"comic": null}));
    }

    #[test]
    fn test_error_statuses() {
        let (status, body) = ErrorResponse::from_source_error(
            &SourceError::MisconfiguredSource(SourceKind::Comic),
            SourceKind::Comic,
        );
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "source_unavailable");

        let (status, body) = ErrorResponse::from_source_error(
            &SourceError::UpstreamUnavailable { status: 401 },
            SourceKind::Comic,
        );
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "upstream_error");
        assert!(!body.message.contains("401"));
    }
}
