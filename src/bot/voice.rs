//! Voice connection seen from a single command invocation.
//!
//! [`VoiceLink`] is what the membership guards in [`checks`](super::checks)
//! talk to. [`SongbirdVoice`] backs it with songbird and the serenity cache.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::Songbird;
use std::sync::Arc;
use tracing::info;

use crate::{
    audio::player::{AudioPlayer, PlaybackControl},
    bot::Context,
    error::{MusicError, MusicResult},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceLink: Send + Sync {
    /// Voice channel the invoker is in.
    fn author_channel(&self) -> Option<ChannelId>;

    /// Voice channel the bot is connected to in this guild.
    async fn bot_channel(&self) -> Option<ChannelId>;

    async fn connect(&self, channel_id: ChannelId) -> Result<()>;

    /// Self-deafens the bot on its current connection.
    async fn deafen(&self) -> Result<()>;

    /// Playback controls of the current connection.
    fn session(&self) -> Result<Box<dyn PlaybackControl>>;
}

pub struct SongbirdVoice {
    manager: Arc<Songbird>,
    player: Arc<AudioPlayer>,
    guild_id: GuildId,
    author_channel: Option<ChannelId>,
}

impl SongbirdVoice {
    /// Captures the invoker's voice state from the cache.
    pub async fn for_invoker(ctx: Context<'_>) -> MusicResult<Self> {
        let guild_id = ctx.guild_id().ok_or(MusicError::GuildOnly)?;
        let manager = songbird::get(ctx.serenity_context())
            .await
            .ok_or_else(|| anyhow::anyhow!("Songbird not initialised"))?;

        let author_id = ctx.author().id;
        let author_channel = ctx.guild().and_then(|guild| {
            guild
                .voice_states
                .get(&author_id)
                .and_then(|voice_state| voice_state.channel_id)
        });

        Ok(Self {
            manager,
            player: Arc::clone(&ctx.data().player),
            guild_id,
            author_channel,
        })
    }
}

#[async_trait]
impl VoiceLink for SongbirdVoice {
    fn author_channel(&self) -> Option<ChannelId> {
        self.author_channel
    }

    async fn bot_channel(&self) -> Option<ChannelId> {
        let call = self.manager.get(self.guild_id)?;
        let channel = call.lock().await.current_channel();

        channel.map(|channel_id| ChannelId::from(channel_id.0))
    }

    async fn connect(&self, channel_id: ChannelId) -> Result<()> {
        self.manager
            .join(self.guild_id, channel_id)
            .await
            .context("Failed to join voice channel")?;

        info!(
            "🔊 Connected to voice channel {} in guild {}",
            channel_id, self.guild_id
        );
        Ok(())
    }

    async fn deafen(&self) -> Result<()> {
        let call = self
            .manager
            .get(self.guild_id)
            .ok_or_else(|| anyhow::anyhow!("No voice connection in guild {}", self.guild_id))?;

        call.lock()
            .await
            .deafen(true)
            .await
            .context("Failed to self-deafen")?;
        Ok(())
    }

    fn session(&self) -> Result<Box<dyn PlaybackControl>> {
        let call = self
            .manager
            .get(self.guild_id)
            .ok_or_else(|| anyhow::anyhow!("Voice connection for guild {} vanished", self.guild_id))?;

        Ok(Box::new(self.player.session(
            Arc::clone(&self.manager),
            self.guild_id,
            call,
        )))
    }
}
