use anyhow::Result;
use std::path::PathBuf;

/// Separator used by `ALLOWED_SONGS`. Song titles routinely contain commas.
const SONG_SEPARATOR: char = '|';

/// Upper bound of the volume multiplier, matching the `volume` command's 250%.
pub const MAX_VOLUME_MULTIPLIER: f32 = 2.5;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Local library
    pub music_dir: PathBuf,
    pub allowed_songs: Vec<String>,

    // External tools
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,

    // Audio
    pub stream_volume: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            discord_token: lookup("DISCORD_TOKEN")
                .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),

            music_dir: lookup("MUSIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.music_dir),
            allowed_songs: match lookup("ALLOWED_SONGS") {
                Some(raw) => parse_song_list(&raw),
                None => defaults.allowed_songs,
            },

            ytdlp_path: lookup("YTDLP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ytdlp_path),
            ffmpeg_path: lookup("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),

            stream_volume: match lookup("STREAM_VOLUME") {
                Some(raw) => raw.trim().parse()?,
                None => defaults.stream_volume,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The token must not be empty
    /// - The prefix must be non-empty and free of whitespace
    /// - The stream volume must be in `(0.0, 2.5]`
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if self.command_prefix.is_empty() {
            anyhow::bail!("Command prefix must not be empty");
        }

        if self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "Command prefix must not contain whitespace, got: {:?}",
                self.command_prefix
            );
        }

        if !(self.stream_volume > 0.0 && self.stream_volume <= MAX_VOLUME_MULTIPLIER) {
            anyhow::bail!(
                "Stream volume must be in (0.0, {}], got: {}",
                MAX_VOLUME_MULTIPLIER,
                self.stream_volume
            );
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix {:?}\n  \
            Library: {} ({} allowed songs)\n  \
            Tools: yt-dlp={}, ffmpeg={}\n  \
            Audio: {}% stream volume",
            self.command_prefix,
            self.music_dir.display(),
            self.allowed_songs.len(),
            self.ytdlp_path.display(),
            self.ffmpeg_path.display(),
            (self.stream_volume * 100.0).round() as u32,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            command_prefix: "!".to_string(),

            music_dir: "music".into(),
            allowed_songs: vec!["Say You Won't Let Go".to_string()],

            ytdlp_path: "yt-dlp".into(),
            ffmpeg_path: "ffmpeg".into(),

            stream_volume: 0.5,
        }
    }
}

fn parse_song_list(raw: &str) -> Vec<String> {
    raw.split(SONG_SEPARATOR)
        .map(str::trim)
        .filter(|song| !song.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config = Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc")])).unwrap();

        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.music_dir, PathBuf::from("music"));
        assert_eq!(config.allowed_songs, vec!["Say You Won't Let Go".to_string()]);
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.stream_volume, 0.5);
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn allowed_songs_are_split_on_pipes() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("ALLOWED_SONGS", "Hello, World | Say You Won't Let Go||  "),
        ]))
        .unwrap();

        assert_eq!(
            config.allowed_songs,
            vec!["Hello, World".to_string(), "Say You Won't Let Go".to_string()]
        );
    }

    #[test]
    fn rejects_bad_prefix_and_volume() {
        assert!(Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "music "),
        ]))
        .is_err());

        assert!(Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("STREAM_VOLUME", "3.0"),
        ]))
        .is_err());

        assert!(Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("STREAM_VOLUME", "loud"),
        ]))
        .is_err());
    }

    #[test]
    fn summary_never_contains_the_token() {
        let config = Config {
            discord_token: "super-secret".to_string(),
            ..Config::default()
        };

        assert!(!config.summary().contains("super-secret"));
        assert!(config.summary().contains("50% stream volume"));
    }
}
