use std::cell::Cell;
use std::time::{Duration, Instant};

use super::{comic_with_cover, comic_without_cover, ScriptedSource};
use crate::covers::discovery::find_with;
use crate::covers::normalize::{cover_image, normalize};
use crate::covers::{find_random_cover_item, Discovery, RetryPolicy, SourceError, SourceKind};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
    }
}

#[test]
fn test_tenth_attempt_wins() {
    let mut script: Vec<_> = (0..9).map(|_| comic_without_cover()).collect();
    script.push(comic_with_cover(10));
    let source = ScriptedSource::new(SourceKind::Comic, script);

    let discovery = find_random_cover_item(&source, &policy(10)).unwrap();

    let Discovery::Found(cover) = discovery else {
        panic!("expected a cover, got {discovery:?}");
    };
    assert_eq!(cover.title, "Saga #10 - Issue 10");
    assert_eq!(cover.cover_url, "https://comicvine.example/10/medium.jpg");
    assert_eq!(source.calls(), 10);
}

#[test]
fn test_exhaustion_is_not_found_and_bounded() {
    let script = (0..25).map(|_| comic_without_cover()).collect();
    let source = ScriptedSource::new(SourceKind::Comic, script);

    let discovery = find_random_cover_item(&source, &policy(10)).unwrap();

    assert_eq!(discovery, Discovery::NotFound);
    assert_eq!(source.calls(), 10);
}

#[test]
fn test_empty_responses_count_as_attempts() {
    let source = ScriptedSource::new(SourceKind::Anime, vec![]);

    let discovery = find_random_cover_item(&source, &policy(4)).unwrap();

    assert_eq!(discovery, Discovery::NotFound);
    assert_eq!(source.calls(), 4);
}

#[test]
fn test_first_success_stops_the_loop() {
    let source = ScriptedSource::new(
        SourceKind::Comic,
        vec![comic_with_cover(1), comic_with_cover(2), comic_with_cover(3)],
    );

    let discovery = find_random_cover_item(&source, &policy(10)).unwrap();

    assert!(matches!(discovery, Discovery::Found(ref cover) if cover.title == "Saga #1 - Issue 1"));
    assert_eq!(source.calls(), 1);
}

#[test]
fn test_fatal_error_aborts_immediately() {
    let source = ScriptedSource::new(
        SourceKind::Comic,
        vec![
            Err(SourceError::UpstreamUnavailable { status: 401 }),
            comic_with_cover(2),
        ],
    );

    let err = find_random_cover_item(&source, &policy(10)).unwrap_err();

    assert!(matches!(err, SourceError::UpstreamUnavailable { status: 401 }));
    assert_eq!(source.calls(), 1);
}

#[test]
fn test_invalid_response_aborts() {
    let source = ScriptedSource::new(
        SourceKind::Anime,
        vec![Err(SourceError::InvalidResponse("expected value".into()))],
    );

    assert!(find_random_cover_item(&source, &policy(10)).is_err());
    assert_eq!(source.calls(), 1);
}

#[test]
fn test_retryable_errors_are_absorbed() {
    let source = ScriptedSource::new(
        SourceKind::Comic,
        vec![
            Err(SourceError::UpstreamUnavailable { status: 503 }),
            Err(SourceError::UpstreamTimeout),
            Err(SourceError::UpstreamUnavailable { status: 420 }),
            Err(SourceError::Transport("connection reset by peer".into())),
            comic_with_cover(5),
        ],
    );

    let discovery = find_random_cover_item(&source, &policy(10)).unwrap();

    assert!(matches!(discovery, Discovery::Found(_)));
    assert_eq!(source.calls(), 5);
}

#[test]
fn test_retryable_errors_exhaust_to_not_found() {
    let script = (0..10).map(|_| Err(SourceError::UpstreamTimeout)).collect();
    let source = ScriptedSource::new(SourceKind::Anime, script);

    let discovery = find_random_cover_item(&source, &policy(3)).unwrap();

    assert_eq!(discovery, Discovery::NotFound);
    assert_eq!(source.calls(), 3);
}

#[test]
fn test_unconfigured_source_is_never_called() {
    let source = ScriptedSource::unconfigured(SourceKind::Comic);

    let err = find_random_cover_item(&source, &policy(10)).unwrap_err();

    assert!(matches!(err, SourceError::MisconfiguredSource(SourceKind::Comic)));
    assert_eq!(source.calls(), 0);
}

#[test]
fn test_normalizer_only_sees_records_with_covers() {
    let source = ScriptedSource::new(
        SourceKind::Comic,
        vec![
            comic_without_cover(),
            Ok(None),
            comic_without_cover(),
            comic_with_cover(4),
        ],
    );
    let normalized = Cell::new(0);

    let discovery = find_with(&source, &policy(10), |raw| {
        assert!(cover_image(raw).is_some(), "normalizer called on a record without a cover");
        normalized.set(normalized.get() + 1);
        normalize(raw)
    })
    .unwrap();

    assert!(matches!(discovery, Discovery::Found(_)));
    assert_eq!(normalized.get(), 1);
    assert_eq!(source.calls(), 4);
}

#[test]
fn test_found_covers_have_title_and_image() {
    for issue in 1..20 {
        let source = ScriptedSource::new(SourceKind::Comic, vec![comic_without_cover(), comic_with_cover(issue)]);
        let Discovery::Found(cover) = find_random_cover_item(&source, &policy(2)).unwrap() else {
            panic!("expected a cover for issue {issue}");
        };
        assert!(!cover.title.is_empty());
        assert!(!cover.cover_url.is_empty());
    }
}

#[test]
fn test_backoff_after_retryable_failure() {
    let source = ScriptedSource::new(
        SourceKind::Anime,
        vec![
            Err(SourceError::UpstreamUnavailable { status: 429 }),
            comic_with_cover(1),
        ],
    );
    let policy = RetryPolicy {
        max_attempts: 5,
        backoff: Duration::from_millis(15),
    };

    let started = Instant::now();
    let discovery = find_random_cover_item(&source, &policy).unwrap();

    assert!(matches!(discovery, Discovery::Found(_)));
    // rate limits wait twice the base backoff
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_no_backoff_after_last_attempt() {
    let source = ScriptedSource::new(SourceKind::Anime, vec![Err(SourceError::UpstreamTimeout)]);
    let policy = RetryPolicy {
        max_attempts: 1,
        backoff: Duration::from_secs(5),
    };

    let started = Instant::now();
    let discovery = find_random_cover_item(&source, &policy).unwrap();

    assert_eq!(discovery, Discovery::NotFound);
    assert!(started.elapsed() < Duration::from_secs(5));
}
