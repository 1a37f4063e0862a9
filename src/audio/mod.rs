//! # Audio Module
//!
//! Per-server playback for the bot.
//!
//! ## Architecture
//!
//! ### [`queue`] - Playback state
//! - Pending songs, current song, playing flag, voice link and player
//! - Pure state transitions, no I/O
//!
//! ### [`player`] - Playback control
//! - [`player::MusicPlayer`], the registry of per-server players
//! - [`player::GuildPlayer`], which drives one server's queue: fetch a
//!   stream, hand it to the voice driver, wait for the end, repeat
//!
//! ### [`backend`] - Voice collaborators
//! - [`backend::AudioBackend`] abstracts voice connections, stream
//!   extraction and track control
//! - [`songbird_backend`] implements it with songbird and yt-dlp
//!
//! ## Usage
//!
//! `main` wraps a [`songbird_backend::SongbirdBackend`] in a
//! [`player::MusicPlayer`]. Handlers then look up the server's
//! [`player::GuildPlayer`] with `guild(guild_id)` and call `enqueue`,
//! `skip`, `pause` or `resume` on it. Tests swap in the in-memory backend
//! from `testing`.

pub mod backend;
pub mod player;
pub mod queue;
pub mod songbird_backend;

#[cfg(test)]
pub mod testing;
