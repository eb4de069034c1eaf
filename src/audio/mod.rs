//! # Audio Module
//!
//! Playback plumbing between the commands and songbird.
//!
//! ### [`library`] - Local songs
//! - Allow-list of titles checked against the music directory at call time
//!
//! ### [`source`] - Audio source adapter
//! - Local file or transcoded stream plus its starting volume
//! - [`source::Volume`], the validated 1-250% level
//!
//! ### [`transcoder`] - ffmpeg
//! - Reconnecting stream decode piped into songbird
//!
//! ### [`player`] - Voice sessions
//! - [`player::PlaybackControl`], the per-guild control surface
//! - Active track handle per guild

pub mod library;
pub mod player;
pub mod source;
pub mod transcoder;
