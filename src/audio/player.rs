use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use songbird::{
    error::ControlError,
    tracks::{PlayMode, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::audio::source::{AudioSource, Volume};

/// Playback state of a connected voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_active(self) -> bool {
        self != PlaybackState::Idle
    }
}

impl From<&PlayMode> for PlaybackState {
    fn from(mode: &PlayMode) -> Self {
        match mode {
            PlayMode::Play => PlaybackState::Playing,
            PlayMode::Pause => PlaybackState::Paused,
            _ => PlaybackState::Idle,
        }
    }
}

/// Controls for the voice connection of a single guild.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    async fn state(&self) -> PlaybackState;

    /// Starts `source`. Callers stop the previous source first.
    async fn play(&self, source: AudioSource) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn set_volume(&self, volume: Volume) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

/// Tracks the active songbird track of every guild.
pub struct AudioPlayer {
    current_tracks: DashMap<GuildId, TrackHandle>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self {
            current_tracks: DashMap::new(),
        }
    }

    pub fn session(
        self: &Arc<Self>,
        manager: Arc<Songbird>,
        guild_id: GuildId,
        call: Arc<Mutex<Call>>,
    ) -> GuildSession {
        GuildSession {
            player: Arc::clone(self),
            manager,
            guild_id,
            call,
        }
    }

    /// Drops the stored track of a guild whose voice connection went away.
    pub fn forget(&self, guild_id: GuildId) {
        if self.current_tracks.remove(&guild_id).is_some() {
            debug!("Dropped track handle for guild {}", guild_id);
        }
    }

    fn current(&self, guild_id: GuildId) -> Option<TrackHandle> {
        self.current_tracks.get(&guild_id).map(|track| track.clone())
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// A guild's songbird call together with its active track.
pub struct GuildSession {
    player: Arc<AudioPlayer>,
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
}

impl GuildSession {
    fn current(&self) -> Result<TrackHandle> {
        self.player
            .current(self.guild_id)
            .ok_or_else(|| anyhow::anyhow!("No active track in guild {}", self.guild_id))
    }
}

#[async_trait]
impl PlaybackControl for GuildSession {
    async fn state(&self) -> PlaybackState {
        let Some(track) = self.player.current(self.guild_id) else {
            return PlaybackState::Idle;
        };

        match track.get_info().await {
            Ok(info) => PlaybackState::from(&info.playing),
            // The driver has already dropped the track
            Err(_) => PlaybackState::Idle,
        }
    }

    async fn play(&self, source: AudioSource) -> Result<()> {
        info!(
            "🎵 Playing {} {:?} at {}% in guild {}",
            if source.is_stream() { "stream" } else { "file" },
            source.title(),
            (source.volume() * 100.0).round(),
            self.guild_id
        );

        let title = source.title().to_string();
        let track = source.into_track()?;

        let handle = {
            let mut handler = self.call.lock().await;
            handler.play(track)
        };

        handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorHandler {
                    guild_id: self.guild_id,
                    title,
                },
            )
            .map_err(|e| anyhow::anyhow!("Failed to register track error handler: {}", e))?;

        self.player.current_tracks.insert(self.guild_id, handle);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.current()?.pause().context("Failed to pause track")?;
        info!("⏸️ Paused playback in guild {}", self.guild_id);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.current()?.play().context("Failed to resume track")?;
        info!("▶️ Resumed playback in guild {}", self.guild_id);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let reached = match self.player.current_tracks.remove(&self.guild_id) {
            Some((_, track)) => stop_reached_track(self.guild_id, track.stop()),
            None => false,
        };
        self.call.lock().await.stop();

        info!(
            "⏹️ Stopped playback in guild {} (track was live: {})",
            self.guild_id, reached
        );
        Ok(())
    }

    async fn set_volume(&self, volume: Volume) -> Result<()> {
        self.current()?
            .set_volume(volume.multiplier())
            .context("Failed to set track volume")?;

        info!(
            "🔊 Volume set to {}% in guild {}",
            volume.percent(),
            self.guild_id
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.manager
            .remove(self.guild_id)
            .await
            .context("Failed to leave voice channel")?;
        self.player.forget(self.guild_id);

        info!("👋 Disconnected from voice in guild {}", self.guild_id);
        Ok(())
    }
}

/// Whether a stop request reached a live track. A track the driver already
/// dropped is logged and otherwise ignored.
fn stop_reached_track(guild_id: GuildId, result: std::result::Result<(), ControlError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Track in guild {} was already gone when stopped: {}", guild_id, e);
            false
        }
    }
}

/// Logs playback failures reported by the driver.
struct TrackErrorHandler {
    guild_id: GuildId,
    title: String,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, _handle) in *track_list {
                error!(
                    "Player error: {:?} while playing {:?} in guild {}",
                    state.playing, self.title, self.guild_id
                );
            }
        }

        None
    }
}
