//! Prefix commands.
//!
//! Each command captures the invoker's voice state, then hands off to a
//! helper that runs argument validation, the membership guard and the
//! playback rule in that order.

use anyhow::Context as _;

use crate::{
    audio::{library::LocalLibrary, source::Volume},
    bot::{
        checks,
        handlers::respond,
        music::{self, Reply},
        voice::{SongbirdVoice, VoiceLink},
        Context,
    },
    error::MusicResult,
    sources::UrlResolver,
};

/// Plays a file from the local filesystem
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[rest]
    #[description = "Title of an allow-listed song"]
    song: String,
) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let reply = play_song(&voice, &ctx.data().library, &song).await?;
    respond(ctx, reply).await
}

/// Streams music via url/search term from YouTube
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn stream(
    ctx: Context<'_>,
    #[rest]
    #[description = "Video URL or search term"]
    query: String,
) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let reply = stream_query(&voice, &ctx.data().resolver, &query).await?;
    respond(ctx, reply).await
}

/// Pause the player
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let session = checks::join(&voice).await?;
    respond(ctx, music::pause(session.as_ref()).await?).await
}

/// Resume the player
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let session = checks::join(&voice).await?;
    respond(ctx, music::resume(session.as_ref()).await?).await
}

/// Changes the player's volume
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume in percent, 1-250"] level: i64,
) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let reply = change_volume(&voice, level).await?;
    respond(ctx, reply).await
}

/// Stop the player
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let session = checks::join(&voice).await?;
    respond(ctx, music::stop(session.as_ref()).await?).await
}

/// Disconnect the bot from voice
#[poise::command(prefix_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> MusicResult<()> {
    let voice = SongbirdVoice::for_invoker(ctx).await?;
    let session = checks::leave(&voice).await?;
    respond(ctx, music::leave(session.as_ref()).await?).await
}

/// Shows this message
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help about"] command: Option<String>,
) -> MusicResult<()> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: "Type help <command> for more info on a command.",
        ..Default::default()
    };

    poise::builtins::help(ctx, command.as_deref(), config)
        .await
        .context("Failed to send help")?;
    Ok(())
}

/// The song is checked before the invoker's voice state.
async fn play_song(voice: &dyn VoiceLink, library: &LocalLibrary, song: &str) -> MusicResult<Reply> {
    let track = library.resolve(song).await?;
    let session = checks::join(voice).await?;
    music::play(session.as_ref(), &track).await
}

async fn stream_query(voice: &dyn VoiceLink, resolver: &UrlResolver, query: &str) -> MusicResult<Reply> {
    let session = checks::join(voice).await?;
    music::stream(session.as_ref(), resolver, query).await
}

/// Out-of-range levels are rejected before the join guard runs.
async fn change_volume(voice: &dyn VoiceLink, level: i64) -> MusicResult<Reply> {
    let volume = Volume::from_percent(level)?;
    let session = checks::join(voice).await?;
    music::volume(session.as_ref(), volume).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{
            player::{MockPlaybackControl, PlaybackControl, PlaybackState},
            transcoder::Transcoder,
        },
        bot::voice::MockVoiceLink,
        error::MusicError,
        sources::MockMediaExtractor,
    };
    use mockall::{predicate::eq, Sequence};
    use pretty_assertions::assert_eq;
    use serenity::model::id::ChannelId;
    use std::sync::Arc;

    const SONG: &str = "Say You Won't Let Go";

    fn lobby() -> ChannelId {
        ChannelId::new(10)
    }

    fn library() -> (tempfile::TempDir, LocalLibrary) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{SONG}.mp3")), b"ID3").unwrap();
        let library = LocalLibrary::new(dir.path(), vec![SONG.to_string()]);
        (dir, library)
    }

    fn invoker_outside_voice() -> MockVoiceLink {
        let mut voice = MockVoiceLink::new();
        voice.expect_author_channel().return_const(None::<ChannelId>);
        voice.expect_bot_channel().return_const(Some(lobby()));
        voice.expect_connect().never();
        voice.expect_session().never();
        voice
    }

    #[tokio::test]
    async fn play_while_disconnected_joins_deafens_then_plays() {
        let (_dir, library) = library();

        let mut session = MockPlaybackControl::new();
        session.expect_state().return_const(PlaybackState::Idle);
        session.expect_stop().never();
        session
            .expect_play()
            .withf(|source| !source.is_stream() && source.title() == "Say You Won't Let Go.mp3")
            .times(1)
            .returning(|_| Ok(()));

        let mut seq = Sequence::new();
        let mut voice = MockVoiceLink::new();
        voice.expect_author_channel().return_const(Some(lobby()));
        voice.expect_bot_channel().return_const(None::<ChannelId>);
        voice
            .expect_connect()
            .with(eq(lobby()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        voice
            .expect_deafen()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        voice
            .expect_session()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move || Ok(Box::new(session) as Box<dyn PlaybackControl>));

        let reply = play_song(&voice, &library, SONG).await.unwrap();

        assert_eq!(reply, Reply::send("Now playing: `Say You Won't Let Go.mp3`."));
    }

    #[tokio::test]
    async fn unknown_songs_are_rejected_before_the_join_guard() {
        let (_dir, library) = library();
        let voice = MockVoiceLink::new();

        let err = play_song(&voice, &library, "Wonderwall").await.unwrap_err();

        assert!(matches!(err, MusicError::UnknownSong(song) if song == "Wonderwall"));
    }

    #[tokio::test]
    async fn out_of_range_volume_returns_before_the_join_guard() {
        for level in [0, 251, -1, i64::MAX] {
            let voice = MockVoiceLink::new();

            let err = change_volume(&voice, level).await.unwrap_err();

            assert_eq!(err.to_string(), "Volume needs to be between 1 and 250.");
        }
    }

    #[tokio::test]
    async fn invoker_outside_voice_never_reaches_the_player() {
        let (_dir, library) = library();

        let err = play_song(&invoker_outside_voice(), &library, SONG)
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::AuthorNotInVoice));

        let err = change_volume(&invoker_outside_voice(), 80).await.unwrap_err();
        assert!(matches!(err, MusicError::AuthorNotInVoice));

        let mut extractor = MockMediaExtractor::new();
        extractor.expect_extract_info().never();
        let resolver = UrlResolver::new(Arc::new(extractor), Transcoder::new("ffmpeg"), 0.5);
        let err = stream_query(&invoker_outside_voice(), &resolver, "lofi beats")
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::AuthorNotInVoice));
    }

    #[tokio::test]
    async fn volume_applies_to_the_shared_session() {
        let mut session = MockPlaybackControl::new();
        session.expect_state().return_const(PlaybackState::Playing);
        session
            .expect_set_volume()
            .withf(|volume| volume.percent() == 80)
            .times(1)
            .returning(|_| Ok(()));

        let mut voice = MockVoiceLink::new();
        voice.expect_author_channel().return_const(Some(lobby()));
        voice.expect_bot_channel().return_const(Some(lobby()));
        voice.expect_connect().never();
        voice.expect_deafen().never();
        voice
            .expect_session()
            .times(1)
            .return_once(move || Ok(Box::new(session) as Box<dyn PlaybackControl>));

        assert_eq!(
            change_volume(&voice, 80).await.unwrap(),
            Reply::reply("Changed volume of the player to 80%.")
        );
    }
}
