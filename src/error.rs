use serenity::model::id::ChannelId;
use thiserror::Error;

/// Errors produced while running a music command.
///
/// Every variant except [`MusicError::Internal`] is a user-state error: its
/// `Display` text is sent back as the description of the reply embed.
/// Internal errors are only logged.
#[derive(Debug, Error)]
pub enum MusicError {
    #[error("This command can only be used in a server.")]
    GuildOnly,

    #[error("Connect to a voice channel first.")]
    AuthorNotInVoice,

    #[error("Connect to <#{0}> first.")]
    WrongChannel(ChannelId),

    #[error("I'm not in a voice channel.")]
    BotNotInVoice,

    #[error("The player is already paused.")]
    AlreadyPaused,

    #[error("The player is not paused.")]
    NotPaused,

    #[error("The player is not playing.")]
    NotPlaying,

    #[error("Volume needs to be between {min} and {max}.")]
    VolumeOutOfRange { min: i64, max: i64 },

    #[error("`{0}` is not an available song.")]
    UnknownSong(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MusicError {
    /// Whether the error should be reported to the invoking user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, MusicError::Internal(_))
    }
}

pub type MusicResult<T> = std::result::Result<T, MusicError>;
