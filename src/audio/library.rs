use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{MusicError, MusicResult};

const SONG_EXTENSION: &str = "mp3";

/// A local file that passed the allow-list check.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTrack {
    pub path: PathBuf,
    pub file_name: String,
}

/// Local songs that `play` may use.
///
/// A song is playable when its title is on the allow-list and
/// `<dir>/<title>.mp3` exists at the moment of the request.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    dir: PathBuf,
    allowed: Vec<String>,
}

impl LocalLibrary {
    pub fn new(dir: impl Into<PathBuf>, allowed: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            allowed,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allow-listed titles currently present on disk, in allow-list order.
    pub async fn available(&self) -> MusicResult<Vec<String>> {
        let on_disk = self.titles_on_disk().await?;

        Ok(self
            .allowed
            .iter()
            .filter(|song| on_disk.contains(song))
            .cloned()
            .collect())
    }

    pub async fn resolve(&self, song: &str) -> MusicResult<LocalTrack> {
        if !self.allowed.iter().any(|allowed| allowed == song) {
            return Err(MusicError::UnknownSong(song.to_string()));
        }

        if !self.titles_on_disk().await?.iter().any(|title| title == song) {
            warn!(
                "📁 Allow-listed song {:?} is missing from {}",
                song,
                self.dir.display()
            );
            return Err(MusicError::UnknownSong(song.to_string()));
        }

        let file_name = format!("{song}.{SONG_EXTENSION}");
        Ok(LocalTrack {
            path: self.dir.join(&file_name),
            file_name,
        })
    }

    async fn titles_on_disk(&self) -> MusicResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read music directory {}", self.dir.display()))?;

        let mut titles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to list music directory")?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SONG_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                titles.push(stem.to_string());
            }
        }

        Ok(titles)
    }
}
