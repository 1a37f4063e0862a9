use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    audio::{
        backend::AudioBackend,
        queue::{PlaybackQueue, QueuePosition, QueueSnapshot, Song},
    },
    error::MusicError,
};

/// Registry of per-server players. Owned by the bot's event handler and
/// passed by reference to whoever needs a server's queue.
pub struct MusicPlayer<B: AudioBackend> {
    backend: Arc<B>,
    guilds: DashMap<GuildId, Arc<GuildPlayer<B>>>,
}

impl<B: AudioBackend> MusicPlayer<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            guilds: DashMap::new(),
        }
    }

    /// Returns the player of `guild_id`, creating it on first use.
    pub fn guild(&self, guild_id: GuildId) -> Arc<GuildPlayer<B>> {
        self.guilds
            .entry(guild_id)
            .or_insert_with(|| Arc::new(GuildPlayer::new(guild_id, self.backend.clone())))
            .clone()
    }

    /// Returns the player of `guild_id` only if one was already created.
    pub fn existing(&self, guild_id: GuildId) -> Option<Arc<GuildPlayer<B>>> {
        self.guilds.get(&guild_id).map(|p| p.clone())
    }

    /// Drops the server's player after tearing its playback down.
    pub async fn evict(&self, guild_id: GuildId) -> bool {
        match self.guilds.remove(&guild_id) {
            Some((_, player)) => {
                player.force_stop().await;
                info!("🧹 Dropped playback state for guild {}", guild_id);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.guilds.len()
    }
}

/// Playback of one server: its queue plus the task driving it.
///
/// Each run of consecutive songs is driven by a single task that fetches a
/// stream, hands it to the voice driver and waits for the track to end
/// before dequeuing the next one. Commands mutate the same queue under its
/// lock; the driver re-checks the queue epoch every time it wakes up.
pub struct GuildPlayer<B: AudioBackend> {
    guild_id: GuildId,
    backend: Arc<B>,
    queue: Mutex<PlaybackQueue<B>>,
}

impl<B: AudioBackend> GuildPlayer<B> {
    pub fn new(guild_id: GuildId, backend: Arc<B>) -> Self {
        Self {
            guild_id,
            backend,
            queue: Mutex::new(PlaybackQueue::new()),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Adds `song` to the queue, starting playback when the queue is idle.
    ///
    /// The caller must have checked that the requester sits in
    /// `channel_id`; this is not verified here. The channel is only used
    /// when no voice link is held yet.
    pub async fn enqueue(
        self: &Arc<Self>,
        song: Song,
        channel_id: ChannelId,
    ) -> Result<QueuePosition, MusicError> {
        let mut queue = self.queue.lock().await;

        if queue.is_playing() {
            return Ok(QueuePosition::Queued(queue.push(song)));
        }

        if queue.voice_link().is_none() {
            let link = self.backend.connect(self.guild_id, channel_id).await?;
            info!(
                "🔊 Joined voice channel {} in guild {}",
                channel_id, self.guild_id
            );
            queue.bind(link);
        }

        // Songs stranded by an earlier failure go first.
        let position = queue.push(song);
        let next = queue.advance();
        drop(queue);

        self.spawn_driver(next);

        Ok(if position == 1 {
            QueuePosition::NowPlaying
        } else {
            QueuePosition::Queued(position - 1)
        })
    }

    /// Ends the current song early and returns it.
    pub async fn skip(self: &Arc<Self>) -> Result<Song, MusicError> {
        let mut queue = self.queue.lock().await;

        let skipped = match queue.current() {
            Some(song) if queue.is_playing() => song.clone(),
            _ => return Err(MusicError::NothingPlaying),
        };

        if queue.player().is_loaded() {
            // The end signal wakes the driver, which dequeues the next song.
            queue.player_mut().stop();
        } else {
            // Still fetching: move on now, the pending fetch gets discarded.
            let next = queue.advance();
            drop(queue);
            self.spawn_driver(next);
        }

        info!("⏭️ Skipped {} in guild {}", skipped.title, self.guild_id);
        Ok(skipped)
    }

    /// Clears the queue and leaves the voice channel.
    pub async fn stop(&self) -> Result<(), MusicError> {
        let link = {
            let mut queue = self.queue.lock().await;
            if !queue.is_playing() {
                return Err(MusicError::NothingPlaying);
            }
            queue.reset()
        };

        if let Some(link) = link {
            self.backend.release(self.guild_id, link).await;
        }

        info!("⏹️ Playback stopped in guild {}", self.guild_id);
        Ok(())
    }

    /// Same teardown as [`GuildPlayer::stop`], whatever the current state.
    /// Returns whether a voice link was released.
    pub async fn force_stop(&self) -> bool {
        let link = self.queue.lock().await.reset();
        self.release(link).await
    }

    /// [`GuildPlayer::force_stop`], but only while the held voice link sits
    /// in `channel_id`. Checked under the queue lock, so a session opened
    /// after the event being handled is left alone.
    pub async fn force_stop_in(&self, channel_id: ChannelId) -> bool {
        let link = {
            let mut queue = self.queue.lock().await;
            let linked = match queue.voice_link() {
                Some(link) => self.backend.link_channel(link).await,
                None => None,
            };
            if linked != Some(channel_id) {
                return false;
            }
            queue.reset()
        };
        self.release(link).await
    }

    async fn release(&self, link: Option<B::Link>) -> bool {
        match link {
            Some(link) => {
                self.backend.release(self.guild_id, link).await;
                true
            }
            None => false,
        }
    }

    pub async fn pause(&self) -> Result<(), MusicError> {
        let queue = self.queue.lock().await;
        if !queue.is_playing() {
            return Err(MusicError::NothingPlaying);
        }
        queue.player().pause();
        info!("⏸️ Paused in guild {}", self.guild_id);
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), MusicError> {
        let queue = self.queue.lock().await;
        if !queue.is_playing() {
            return Err(MusicError::NothingPlaying);
        }
        queue.player().resume();
        info!("▶️ Resumed in guild {}", self.guild_id);
        Ok(())
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        self.queue.lock().await.snapshot()
    }

    /// Voice channel the bot occupies in this server, if connected.
    pub async fn voice_channel(&self) -> Option<ChannelId> {
        let queue = self.queue.lock().await;
        match queue.voice_link() {
            Some(link) => self.backend.link_channel(link).await,
            None => None,
        }
    }

    fn spawn_driver(self: &Arc<Self>, next: Option<(Song, u64)>) {
        if let Some(next) = next {
            let player = Arc::clone(self);
            tokio::spawn(async move { player.drive(next).await });
        }
    }

    async fn drive(self: Arc<Self>, first: (Song, u64)) {
        let mut next = Some(first);

        while let Some((song, epoch)) = next.take() {
            let stream = self.backend.open_stream(&song).await;

            let finished = {
                let mut queue = self.queue.lock().await;

                if !queue.is_epoch(epoch) {
                    debug!(
                        "🗑️ Discarding stream of {} in guild {}, queue moved on",
                        song.title, self.guild_id
                    );
                    return;
                }

                let started = match (stream, queue.voice_link()) {
                    (Ok(stream), Some(link)) => self.backend.start(link, stream).await,
                    (Ok(_), None) => Err(MusicError::PlaybackFailure("no voice link".into())),
                    (Err(err), _) => Err(err),
                };

                match started {
                    Ok(track) => {
                        info!("🎵 Now playing {} in guild {}", song.title, self.guild_id);
                        queue.player_mut().load(track.control);
                        track.finished
                    }
                    Err(err) => {
                        error!(
                            "❌ Could not play {} in guild {}: {}",
                            song.title, self.guild_id, err
                        );
                        queue.fail(epoch);
                        return;
                    }
                }
            };

            // A dropped sender means the driver lost the track; same as an end.
            let _ = finished.await;

            let mut queue = self.queue.lock().await;
            if !queue.is_epoch(epoch) {
                return;
            }
            next = queue.advance();
        }
    }
}
