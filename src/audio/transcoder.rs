use anyhow::{Context, Result};
use std::{
    path::PathBuf,
    process::{Child, Command, Stdio},
};
use tracing::debug;

/// ffmpeg invocation used to decode network streams.
///
/// The child writes 48kHz stereo WAV to stdout, which songbird probes and
/// decodes through symphonia.
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: PathBuf,
    before_options: Vec<String>,
    options: Vec<String>,
}

impl Transcoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            // Reconnect when the remote drops the stream
            before_options: to_args(&[
                "-reconnect",
                "1",
                "-reconnect_streamed",
                "1",
                "-reconnect_delay_max",
                "5",
            ]),
            options: to_args(&["-vn", "-filter:a", "volume=0.25"]),
        }
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// Full argument list for decoding `url`.
    pub fn args(&self, url: &str) -> Vec<String> {
        let mut args = to_args(&["-hide_banner", "-loglevel", "error"]);
        args.extend(self.before_options.iter().cloned());
        args.push("-i".to_string());
        args.push(url.to_string());
        args.extend(self.options.iter().cloned());
        args.extend(to_args(&[
            "-c:a", "pcm_s16le", "-ar", "48000", "-ac", "2", "-f", "wav", "pipe:1",
        ]));
        args
    }

    pub fn spawn(&self, url: &str) -> Result<Child> {
        debug!("🎛️ Spawning {} for stream", self.binary.display());

        Command::new(&self.binary)
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.binary.display()))
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_flags_precede_the_input() {
        let args = Transcoder::new("ffmpeg").args("https://cdn.example/audio");
        let input = args.iter().position(|a| a == "-i").unwrap();
        let reconnect = args.iter().position(|a| a == "-reconnect_streamed").unwrap();

        assert!(reconnect < input);
        assert_eq!(args[input + 1], "https://cdn.example/audio");
    }

    #[test]
    fn output_drops_video_and_applies_the_volume_filter() {
        let args = Transcoder::new("ffmpeg").args("https://cdn.example/audio");
        let input = args.iter().position(|a| a == "-i").unwrap();
        let output = &args[input + 2..];

        assert!(output.contains(&"-vn".to_string()));
        let filter = output.iter().position(|a| a == "-filter:a").unwrap();
        assert_eq!(output[filter + 1], "volume=0.25");
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }
}
