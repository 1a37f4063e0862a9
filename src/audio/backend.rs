use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::oneshot;

use crate::{audio::queue::Song, error::MusicError};

/// Control surface of a track that has been handed to the voice driver.
pub trait TrackControl: Send + Sync + 'static {
    fn stop(&self);
    fn pause(&self);
    fn resume(&self);
}

/// A track that started playing, plus the signal fired once it ends
/// (naturally, by `stop`, or because the driver dropped it).
pub struct StartedTrack<T> {
    pub control: T,
    pub finished: oneshot::Receiver<()>,
}

/// Voice transport and stream extraction, as seen by the playback queue.
///
/// The production implementation is [`SongbirdBackend`]; tests swap in an
/// in-memory fake.
///
/// [`SongbirdBackend`]: crate::audio::songbird_backend::SongbirdBackend
#[async_trait]
pub trait AudioBackend: Send + Sync + 'static {
    /// An open voice session in one channel.
    type Link: Send + Sync + 'static;
    /// Audio ready to be played.
    type Stream: Send + 'static;
    type Track: TrackControl;

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId)
        -> Result<Self::Link, MusicError>;

    /// Channel currently occupied by the link.
    async fn link_channel(&self, link: &Self::Link) -> Option<ChannelId>;

    async fn open_stream(&self, song: &Song) -> Result<Self::Stream, MusicError>;

    async fn start(
        &self,
        link: &Self::Link,
        stream: Self::Stream,
    ) -> Result<StartedTrack<Self::Track>, MusicError>;

    /// Tears the voice session down. Never fails; problems are logged.
    async fn release(&self, guild_id: GuildId, link: Self::Link);
}
