//! Voice-channel membership guards.
//!
//! Both guards take the invoker's and the bot's current voice channels,
//! read fresh from the cache and songbird on every command.

use serenity::model::id::ChannelId;
use tracing::debug;

use crate::{
    audio::player::PlaybackControl,
    bot::voice::VoiceLink,
    error::{MusicError, MusicResult},
};

/// What the join guard decided to do with the voice connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    /// The bot is already in the invoker's channel.
    Reuse(ChannelId),
    /// The bot is not connected and should join this channel.
    Connect(ChannelId),
}

pub fn join_decision(
    author_channel: Option<ChannelId>,
    bot_channel: Option<ChannelId>,
) -> MusicResult<JoinDecision> {
    let author_channel = author_channel.ok_or(MusicError::AuthorNotInVoice)?;

    match bot_channel {
        Some(bot_channel) if bot_channel == author_channel => Ok(JoinDecision::Reuse(bot_channel)),
        Some(bot_channel) => Err(MusicError::WrongChannel(bot_channel)),
        None => Ok(JoinDecision::Connect(author_channel)),
    }
}

/// `leave` requires a connected bot and an invoker in the same channel.
pub fn leave_check(
    author_channel: Option<ChannelId>,
    bot_channel: Option<ChannelId>,
) -> MusicResult<ChannelId> {
    let bot_channel = bot_channel.ok_or(MusicError::BotNotInVoice)?;

    if author_channel != Some(bot_channel) {
        return Err(MusicError::WrongChannel(bot_channel));
    }

    Ok(bot_channel)
}

/// Join guard: returns the session for the invoker's channel, connecting and
/// self-deafening first when the bot is not in voice.
pub async fn join(voice: &dyn VoiceLink) -> MusicResult<Box<dyn PlaybackControl>> {
    let decision = join_decision(voice.author_channel(), voice.bot_channel().await)?;

    match decision {
        JoinDecision::Reuse(channel_id) => debug!("Reusing voice connection in {}", channel_id),
        JoinDecision::Connect(channel_id) => {
            voice.connect(channel_id).await?;
            voice.deafen().await?;
        }
    }

    Ok(voice.session()?)
}

/// Leave guard: returns the session of the channel shared with the invoker.
pub async fn leave(voice: &dyn VoiceLink) -> MusicResult<Box<dyn PlaybackControl>> {
    leave_check(voice.author_channel(), voice.bot_channel().await)?;

    Ok(voice.session()?)
}
