mod discovery;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::covers::types::{
    AnimeImageSet, AnimeImages, AnimeRaw, ComicImage, ComicRaw, ComicVolume,
};
use crate::covers::{CoverSource, RawRecord, SourceError, SourceKind};

pub type Candidate = Result<Option<RawRecord>, SourceError>;

/// A source that replays a fixed script of answers and counts how often it was asked.
/// Once the script runs out it answers with empty responses.
pub struct ScriptedSource {
    kind: SourceKind,
    configured: bool,
    script: Mutex<VecDeque<Candidate>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(kind: SourceKind, script: Vec<Candidate>) -> Self {
        Self {
            kind,
            configured: true,
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source whose credential is missing.
    pub fn unconfigured(kind: SourceKind) -> Self {
        Self {
            configured: false,
            ..Self::new(kind, vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CoverSource for ScriptedSource {
    fn fetch_random_candidate(&self) -> Candidate {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.configured {
            return Err(SourceError::MisconfiguredSource(self.kind));
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn ensure_configured(&self) -> Result<(), SourceError> {
        if self.configured {
            Ok(())
        } else {
            Err(SourceError::MisconfiguredSource(self.kind))
        }
    }
}

pub fn comic_with_cover(issue: u32) -> Candidate {
    Ok(Some(RawRecord::Comic(ComicRaw {
        id: Some(issue as u64),
        name: Some(format!("Issue {issue}")),
        issue_number: Some(issue.to_string()),
        volume: Some(ComicVolume {
            id: Some(1),
            name: Some("Saga".into()),
        }),
        cover_date: Some("2012-03-14".into()),
        image: Some(ComicImage {
            medium_url: Some(format!("https://comicvine.example/{issue}/medium.jpg")),
            ..Default::default()
        }),
        site_detail_url: Some(format!("https://comicvine.gamespot.com/saga-{issue}/4000-{issue}/")),
    })))
}

pub fn comic_without_cover() -> Candidate {
    Ok(Some(RawRecord::Comic(ComicRaw {
        name: Some("No Art".into()),
        volume: Some(ComicVolume {
            id: Some(2),
            name: Some("Blank".into()),
        }),
        image: Some(ComicImage::default()),
        ..Default::default()
    })))
}

pub fn anime(english: Option<&str>, title: &str, image: Option<&str>) -> Candidate {
    Ok(Some(RawRecord::Anime(AnimeRaw {
        mal_id: Some(38000),
        url: Some("https://myanimelist.net/anime/38000".into()),
        title: Some(title.into()),
        title_english: english.map(Into::into),
        images: image.map(|url| AnimeImages {
            jpg: Some(AnimeImageSet {
                image_url: None,
                large_image_url: Some(url.into()),
            }),
            webp: None,
        }),
        year: Some(2019),
        aired: None,
    })))
}
