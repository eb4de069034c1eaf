use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{library::LocalLibrary, transcoder::Transcoder};
use crate::bot::{Data, JukeboxBot};
use crate::config::Config;
use crate::sources::{ExtractorOptions, MediaExtractor, UrlResolver, YtDlpClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Starting jukebox v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    let ytdlp = YtDlpClient::new(config.ytdlp_path.clone(), ExtractorOptions::default());
    let transcoder = Transcoder::new(config.ffmpeg_path.clone());

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&ytdlp, &transcoder).await;
    }

    info!("{}", config.summary());

    // Shared by every command for the lifetime of the process
    let extractor: Arc<dyn MediaExtractor> = Arc::new(ytdlp);
    let resolver = UrlResolver::new(extractor, transcoder, config.stream_volume);
    let library = LocalLibrary::new(config.music_dir.clone(), config.allowed_songs.clone());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let token = config.discord_token.clone();
    let options = bot::framework_options(&config.command_prefix);
    let data = Data::new(config, library, resolver);
    let handler = JukeboxBot::new(&data);

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |_ctx, _ready, _framework| Box::pin(async move { Ok(data) }))
        .build();

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .framework(framework)
        .register_songbird()
        .await?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Shutdown signal received, exiting...");
        std::process::exit(0);
    });

    info!("🚀 Bot started");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}

async fn health_check(ytdlp: &YtDlpClient, transcoder: &Transcoder) -> Result<()> {
    let ytdlp = async_process::Command::new(ytdlp.binary())
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new(transcoder.binary())
        .arg("-version")
        .output()
        .await?;

    if ytdlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Missing dependencies: yt-dlp and ffmpeg must both run");
    }
}
