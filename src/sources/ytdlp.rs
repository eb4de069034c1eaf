use anyhow::{Context, Result};
use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{MediaExtractor, TrackMetadata};

/// Options handed to yt-dlp on every extraction.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub format: String,
    pub output_template: String,
    pub restrict_filenames: bool,
    pub no_playlist: bool,
    pub no_check_certificates: bool,
    pub quiet: bool,
    pub no_warnings: bool,
    pub default_search: String,
    pub source_address: String,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            format: "bestaudio/best".to_string(),
            output_template: "%(extractor)s-%(id)s-%(title)s.%(ext)s".to_string(),
            restrict_filenames: true,
            no_playlist: true,
            no_check_certificates: true,
            quiet: true,
            no_warnings: true,
            default_search: "auto".to_string(),
            source_address: "0.0.0.0".to_string(),
        }
    }
}

impl ExtractorOptions {
    fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            self.format.clone(),
            "--output".to_string(),
            self.output_template.clone(),
            "--default-search".to_string(),
            self.default_search.clone(),
            "--source-address".to_string(),
            self.source_address.clone(),
        ];

        let flags = [
            (self.restrict_filenames, "--restrict-filenames"),
            (self.no_playlist, "--no-playlist"),
            (self.no_check_certificates, "--no-check-certificates"),
            (self.quiet, "--quiet"),
            (self.no_warnings, "--no-warnings"),
        ];
        args.extend(
            flags
                .into_iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        args
    }
}

/// Extraction client backed by the yt-dlp executable.
///
/// Built once at startup and shared by every command.
#[derive(Debug, Clone)]
pub struct YtDlpClient {
    binary: PathBuf,
    options: ExtractorOptions,
}

impl YtDlpClient {
    pub fn new(binary: impl Into<PathBuf>, options: ExtractorOptions) -> Self {
        Self {
            binary: binary.into(),
            options,
        }
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    fn args(&self, query: &str) -> Vec<String> {
        let mut args = self.options.to_args();
        args.push("--dump-single-json".to_string());
        // Queries starting with '-' must not be read as options
        args.push("--".to_string());
        args.push(query.to_string());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpClient {
    async fn extract_info(&self, query: &str) -> Result<TrackMetadata> {
        info!("🔍 Extracting with yt-dlp: {}", query);

        // The child runs outside the runtime; only the wait is awaited here
        let output = Command::new(&self.binary)
            .args(self.args(query))
            .output()
            .await
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = parse_info(&stdout)?;
        debug!("📊 Resolved {:?} to {}", metadata.title, metadata.url);

        Ok(metadata)
    }
}

#[derive(Debug, Deserialize)]
struct ExtractedInfo {
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    entries: Option<Vec<ExtractedInfo>>,
}

/// Picks the playable entry out of yt-dlp's JSON output.
///
/// Collections (search results, playlists) yield their first entry.
fn parse_info(raw: &str) -> Result<TrackMetadata> {
    let mut info: ExtractedInfo =
        serde_json::from_str(raw).context("Failed to parse yt-dlp output")?;

    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("yt-dlp returned no results"))?;
    }

    let url = info
        .url
        .ok_or_else(|| anyhow::anyhow!("yt-dlp did not return a media URL"))?;

    Ok(TrackMetadata {
        title: info.title.unwrap_or_else(|| "Unknown title".to_string()),
        url,
        webpage_url: info.webpage_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_video_is_used_directly() {
        let raw = r#"{
            "id": "abc",
            "title": "Say You Won't Let Go",
            "url": "https://rr1.googlevideo.example/videoplayback?id=abc",
            "webpage_url": "https://www.youtube.com/watch?v=abc"
        }"#;

        assert_eq!(
            parse_info(raw).unwrap(),
            TrackMetadata {
                title: "Say You Won't Let Go".to_string(),
                url: "https://rr1.googlevideo.example/videoplayback?id=abc".to_string(),
                webpage_url: Some("https://www.youtube.com/watch?v=abc".to_string()),
            }
        );
    }

    #[test]
    fn collections_yield_their_first_entry() {
        let raw = r#"{
            "_type": "playlist",
            "title": "search results",
            "entries": [
                {"title": "First", "url": "https://cdn.example/1"},
                {"title": "Second", "url": "https://cdn.example/2"}
            ]
        }"#;

        let metadata = parse_info(raw).unwrap();

        assert_eq!(metadata.title, "First");
        assert_eq!(metadata.url, "https://cdn.example/1");
    }

    #[test]
    fn empty_collections_and_missing_urls_are_errors() {
        assert!(parse_info(r#"{"entries": []}"#).is_err());
        assert!(parse_info(r#"{"title": "No stream"}"#).is_err());
        assert!(parse_info("not json").is_err());
    }

    #[test]
    fn missing_title_falls_back() {
        let metadata = parse_info(r#"{"url": "https://cdn.example/1"}"#).unwrap();
        assert_eq!(metadata.title, "Unknown title");
    }

    #[test]
    fn args_carry_options_and_end_with_the_query() {
        let client = YtDlpClient::new("yt-dlp", ExtractorOptions::default());
        let args = client.args("-rf lofi beats");

        for expected in [
            "--no-playlist",
            "--restrict-filenames",
            "--no-check-certificates",
            "--quiet",
            "--no-warnings",
            "--dump-single-json",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected}");
        }

        let format = args.iter().position(|a| a == "--format").unwrap();
        assert_eq!(args[format + 1], "bestaudio/best");
        let search = args.iter().position(|a| a == "--default-search").unwrap();
        assert_eq!(args[search + 1], "auto");
        assert_eq!(&args[args.len() - 2..], ["--", "-rf lofi beats"]);
    }

    #[test]
    fn disabled_flags_are_omitted() {
        let options = ExtractorOptions {
            quiet: false,
            no_playlist: false,
            ..ExtractorOptions::default()
        };
        let args = options.to_args();

        assert!(!args.iter().any(|a| a == "--quiet"));
        assert!(!args.iter().any(|a| a == "--no-playlist"));
        assert!(args.iter().any(|a| a == "--no-warnings"));
    }
}
