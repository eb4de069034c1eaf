//! Playback commands.
//!
//! Each command runs after its membership guard passed and works against a
//! [`PlaybackControl`], so the state rules here hold for any voice backend.

use crate::{
    audio::{
        library::LocalTrack,
        player::{PlaybackControl, PlaybackState},
        source::{AudioSource, Volume},
    },
    error::{MusicError, MusicResult},
    sources::UrlResolver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Answer the invoking message.
    Reply,
    /// Post to the channel.
    Send,
}

/// Text sent back to the channel inside an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

impl Reply {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Reply,
            text: text.into(),
        }
    }

    pub fn send(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Send,
            text: text.into(),
        }
    }
}

pub async fn play(session: &dyn PlaybackControl, track: &LocalTrack) -> MusicResult<Reply> {
    stop_active(session).await?;
    session.play(AudioSource::local(track)).await?;

    Ok(Reply::send(format!("Now playing: `{}`.", track.file_name)))
}

pub async fn stream(
    session: &dyn PlaybackControl,
    resolver: &UrlResolver,
    query: &str,
) -> MusicResult<Reply> {
    let source = resolver.from_url(query).await?;
    let text = format!(
        "Now playing: [{}]({}).",
        source.title(),
        source.url().unwrap_or_default()
    );

    stop_active(session).await?;
    session.play(source).await?;

    Ok(Reply::send(text))
}

pub async fn pause(session: &dyn PlaybackControl) -> MusicResult<Reply> {
    match session.state().await {
        PlaybackState::Playing => {
            session.pause().await?;
            Ok(Reply::reply("Paused the player."))
        }
        PlaybackState::Paused => Err(MusicError::AlreadyPaused),
        PlaybackState::Idle => Err(MusicError::NotPlaying),
    }
}

pub async fn resume(session: &dyn PlaybackControl) -> MusicResult<Reply> {
    if session.state().await != PlaybackState::Paused {
        return Err(MusicError::NotPaused);
    }

    session.resume().await?;
    Ok(Reply::reply("Resumed the player."))
}

pub async fn volume(session: &dyn PlaybackControl, volume: Volume) -> MusicResult<Reply> {
    if !session.state().await.is_active() {
        return Err(MusicError::NotPlaying);
    }

    session.set_volume(volume).await?;
    Ok(Reply::reply(format!(
        "Changed volume of the player to {}%.",
        volume.percent()
    )))
}

pub async fn stop(session: &dyn PlaybackControl) -> MusicResult<Reply> {
    if !session.state().await.is_active() {
        return Err(MusicError::NotPlaying);
    }

    session.stop().await?;
    Ok(Reply::reply("Stopped the player."))
}

pub async fn leave(session: &dyn PlaybackControl) -> MusicResult<Reply> {
    stop_active(session).await?;
    session.disconnect().await?;

    Ok(Reply::reply("Disconnected the player."))
}

/// Keeps at most one source per connection.
async fn stop_active(session: &dyn PlaybackControl) -> MusicResult<()> {
    if session.state().await.is_active() {
        session.stop().await?;
    }
    Ok(())
}
