//! # Bot Module
//!
//! Discord side of jukebox: the poise prefix commands, the voice-channel
//! membership guards and the playback rules.
//!
//! ## Architecture
//!
//! Commands in [`commands`] are registered with poise through
//! [`framework_options`]. Each one builds a [`voice::SongbirdVoice`] for the
//! invoker, runs the matching guard from [`checks`] and hands the resulting
//! session to the rule in [`music`]. Errors come back through
//! [`handlers::on_error`].
//!
//! [`JukeboxBot`] implements Serenity's [`EventHandler`] for the gateway
//! events that are not commands.

use serenity::{
    all::{Context as SerenityContext, EventHandler, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{info, warn};

pub mod checks;
pub mod commands;
pub mod handlers;
pub mod music;
pub mod voice;

use crate::{
    audio::{library::LocalLibrary, player::AudioPlayer},
    config::Config,
    error::MusicError,
    sources::UrlResolver,
};

pub type Context<'a> = poise::Context<'a, Data, MusicError>;

/// State shared by every command.
///
/// Everything here is built once at startup and shared read-only, except
/// the per-guild track handles inside [`AudioPlayer`].
#[derive(Clone)]
pub struct Data {
    pub config: Arc<Config>,
    pub library: Arc<LocalLibrary>,
    pub resolver: Arc<UrlResolver>,
    pub player: Arc<AudioPlayer>,
}

impl Data {
    pub fn new(config: Config, library: LocalLibrary, resolver: UrlResolver) -> Self {
        Self {
            config: Arc::new(config),
            library: Arc::new(library),
            resolver: Arc::new(resolver),
            player: Arc::new(AudioPlayer::new()),
        }
    }
}

/// Registers every command under the configured text prefix.
pub fn framework_options(prefix: &str) -> poise::FrameworkOptions<Data, MusicError> {
    poise::FrameworkOptions {
        commands: vec![
            commands::play(),
            commands::stream(),
            commands::pause(),
            commands::resume(),
            commands::volume(),
            commands::stop(),
            commands::leave(),
            commands::help(),
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        },
        on_error: |error| Box::pin(handlers::on_error(error)),
        pre_command: |ctx| Box::pin(handlers::log_invocation(ctx)),
        ..Default::default()
    }
}

/// Gateway events outside the command framework.
pub struct JukeboxBot {
    library: Arc<LocalLibrary>,
    player: Arc<AudioPlayer>,
}

impl JukeboxBot {
    pub fn new(data: &Data) -> Self {
        Self {
            library: Arc::clone(&data.library),
            player: Arc::clone(&data.player),
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, _ctx: SerenityContext, ready: Ready) {
        info!("🤖 {} is online!", ready.user.name);
        info!("📊 Connected to {} servers", ready.guilds.len());

        match self.library.available().await {
            Ok(songs) if songs.is_empty() => warn!(
                "📁 No allow-listed songs found in {}",
                self.library.dir().display()
            ),
            Ok(songs) => info!("📁 Local songs available: {}", songs.join(", ")),
            Err(e) => warn!("📁 Could not read music directory: {}", e),
        }
    }

    async fn voice_state_update(&self, ctx: SerenityContext, old: Option<VoiceState>, new: VoiceState) {
        // Disconnected by someone else: drop the stale track handle
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }

        if let Some(guild_id) = new.guild_id {
            info!("🔌 Bot disconnected from voice in guild {}", guild_id);
            self.player.forget(guild_id);
        }
    }
}
