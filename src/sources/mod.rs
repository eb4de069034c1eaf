//! # Sources Module
//!
//! Turns a free-text query or URL into a playable stream.
//!
//! [`MediaExtractor`] is the seam to the extraction backend
//! ([`ytdlp::YtDlpClient`] in production); [`UrlResolver`] combines it with
//! the transcoder to produce an [`AudioSource`].

pub mod ytdlp;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::audio::{source::AudioSource, transcoder::Transcoder};

pub use ytdlp::{ExtractorOptions, YtDlpClient};

/// Track information resolved by the extraction backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    /// Direct media URL the transcoder reads from.
    pub url: String,
    pub webpage_url: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolves `query` to a single playable track.
    async fn extract_info(&self, query: &str) -> Result<TrackMetadata>;
}

pub struct UrlResolver {
    extractor: Arc<dyn MediaExtractor>,
    transcoder: Transcoder,
    stream_volume: f32,
}

impl UrlResolver {
    pub fn new(extractor: Arc<dyn MediaExtractor>, transcoder: Transcoder, stream_volume: f32) -> Self {
        Self {
            extractor,
            transcoder,
            stream_volume,
        }
    }

    /// Resolves `query` into a stream source.
    ///
    /// Extraction failures are returned as-is.
    pub async fn from_url(&self, query: &str) -> Result<AudioSource> {
        let metadata = self.extractor.extract_info(query).await?;
        info!(
            "🔗 Resolved stream: {} ({})",
            metadata.title,
            metadata.webpage_url.as_deref().unwrap_or(&metadata.url)
        );

        Ok(AudioSource::stream(
            metadata,
            self.transcoder.clone(),
            self.stream_volume,
        ))
    }
}
