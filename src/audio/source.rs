use anyhow::Result;
use songbird::{
    input::{ChildContainer, File, Input},
    tracks::Track,
};
use std::path::PathBuf;

use crate::{
    audio::{library::LocalTrack, transcoder::Transcoder},
    error::{MusicError, MusicResult},
    sources::TrackMetadata,
};

pub const MIN_VOLUME_PERCENT: i64 = 1;
pub const MAX_VOLUME_PERCENT: i64 = 250;

/// Validated volume level, expressed in percent of the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume(u16);

impl Volume {
    pub fn from_percent(percent: i64) -> MusicResult<Self> {
        if !(MIN_VOLUME_PERCENT..=MAX_VOLUME_PERCENT).contains(&percent) {
            return Err(MusicError::VolumeOutOfRange {
                min: MIN_VOLUME_PERCENT,
                max: MAX_VOLUME_PERCENT,
            });
        }

        Ok(Self(percent as u16))
    }

    pub fn percent(self) -> u16 {
        self.0
    }

    /// Multiplier applied to the track, `percent / 100`.
    pub fn multiplier(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

#[derive(Debug, Clone)]
enum SourceKind {
    File(PathBuf),
    Stream { url: String, transcoder: Transcoder },
}

/// Playable audio plus the volume it starts at.
///
/// Nothing is opened or spawned until [`AudioSource::into_track`] runs, so
/// a source can be built and inspected without touching the voice driver.
#[derive(Debug, Clone)]
pub struct AudioSource {
    kind: SourceKind,
    volume: f32,
    title: String,
    url: Option<String>,
}

impl AudioSource {
    pub fn local(track: &LocalTrack) -> Self {
        Self {
            kind: SourceKind::File(track.path.clone()),
            volume: 1.0,
            title: track.file_name.clone(),
            url: None,
        }
    }

    pub fn stream(metadata: TrackMetadata, transcoder: Transcoder, volume: f32) -> Self {
        Self {
            kind: SourceKind::Stream {
                url: metadata.url.clone(),
                transcoder,
            },
            volume,
            title: metadata.title,
            url: Some(metadata.url),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.kind, SourceKind::Stream { .. })
    }

    /// Opens the file or spawns the transcoder and wraps it in a track.
    pub fn into_track(self) -> Result<Track> {
        let input: Input = match self.kind {
            SourceKind::File(path) => File::new(path).into(),
            SourceKind::Stream { url, transcoder } => {
                ChildContainer::from(transcoder.spawn(&url)?).into()
            }
        };

        Ok(Track::new(input).volume(self.volume))
    }
}
