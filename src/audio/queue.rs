use serenity::model::id::UserId;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::audio::backend::{AudioBackend, TrackControl};

/// A resolved track waiting in, or playing from, a server's queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub title: String,
    pub source_url: String,
    /// Whole seconds; `None` when the extractor could not tell.
    pub duration_secs: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub requested_by: UserId,
}

/// Where a freshly enqueued song ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    /// The queue was idle and the song went straight to the player.
    NowPlaying,
    /// 1-based position among the pending songs.
    Queued(usize),
}

/// Read-only view handed to the display layer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSnapshot {
    pub current: Option<Song>,
    pub pending: Vec<Song>,
    pub is_playing: bool,
    pub connected: bool,
}

impl QueueSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }
}

/// Wraps the track loaded into the voice driver. One per queue, reused
/// across songs.
pub struct Player<T> {
    track: Option<T>,
}

impl<T: TrackControl> Player<T> {
    pub fn new() -> Self {
        Self { track: None }
    }

    pub fn load(&mut self, track: T) {
        if let Some(previous) = self.track.replace(track) {
            previous.stop();
        }
    }

    /// Stops the loaded track. Its end signal fires afterwards.
    pub fn stop(&mut self) {
        if let Some(track) = self.track.take() {
            track.stop();
        }
    }

    pub fn pause(&self) {
        if let Some(track) = &self.track {
            track.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(track) = &self.track {
            track.resume();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.track.is_some()
    }

    /// Forgets a track that already ended, without signalling it again.
    fn unload(&mut self) {
        self.track = None;
    }
}

impl<T: TrackControl> Default for Player<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback state of one server.
///
/// `epoch` changes every time a song is dequeued and every time the queue is
/// reset. Work that crossed a suspension point (a stream fetch, a wait for
/// the end of a track) compares the epoch it started with before touching
/// the queue again, and backs off on mismatch.
pub struct PlaybackQueue<B: AudioBackend> {
    pending: VecDeque<Song>,
    current: Option<Song>,
    is_playing: bool,
    voice_link: Option<B::Link>,
    player: Player<B::Track>,
    epoch: u64,
}

impl<B: AudioBackend> PlaybackQueue<B> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            is_playing: false,
            voice_link: None,
            player: Player::new(),
            epoch: 0,
        }
    }

    /// Appends to the pending list and returns its new length.
    pub fn push(&mut self, song: Song) -> usize {
        info!("➕ Queued: {}", song.title);
        self.pending.push_back(song);
        self.pending.len()
    }

    /// Moves the head of `pending` into `current`, or goes idle when nothing
    /// is left. Returns the dequeued song with the epoch it belongs to.
    pub fn advance(&mut self) -> Option<(Song, u64)> {
        self.player.unload();
        self.epoch += 1;

        match self.pending.pop_front() {
            Some(song) => {
                debug!("➡️ Next in queue: {}", song.title);
                self.current = Some(song.clone());
                self.is_playing = true;
                Some((song, self.epoch))
            }
            None => {
                debug!("📭 Queue drained");
                self.current = None;
                self.is_playing = false;
                None
            }
        }
    }

    /// Drops back to idle after the song of `epoch` failed to start. Pending
    /// songs stay where they are.
    pub fn fail(&mut self, epoch: u64) {
        if self.epoch != epoch {
            return;
        }
        self.current = None;
        self.is_playing = false;
        self.player.unload();
    }

    /// Clears everything and hands back the voice link so the caller can
    /// release it outside the lock.
    pub fn reset(&mut self) -> Option<B::Link> {
        self.pending.clear();
        self.current = None;
        self.is_playing = false;
        self.player.stop();
        self.epoch += 1;
        self.voice_link.take()
    }

    pub fn is_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current(&self) -> Option<&Song> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn pending(&self) -> impl Iterator<Item = &Song> {
        self.pending.iter()
    }

    pub fn voice_link(&self) -> Option<&B::Link> {
        self.voice_link.as_ref()
    }

    pub fn bind(&mut self, link: B::Link) {
        self.voice_link = Some(link);
    }

    pub fn player(&self) -> &Player<B::Track> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<B::Track> {
        &mut self.player
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current.clone(),
            pending: self.pending.iter().cloned().collect(),
            is_playing: self.is_playing,
            connected: self.voice_link.is_some(),
        }
    }
}

impl<B: AudioBackend> Default for PlaybackQueue<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{song, FakeBackend, FakeLink};
    use pretty_assertions::assert_eq;
    use serenity::model::id::ChannelId;

    fn queue() -> PlaybackQueue<FakeBackend> {
        PlaybackQueue::new()
    }

    #[test]
    fn fresh_queue_is_idle() {
        let q = queue();
        let snap = q.snapshot();
        assert!(snap.is_empty());
        assert!(!snap.is_playing);
        assert!(!snap.connected);
    }

    #[test]
    fn advance_pops_in_fifo_order() {
        let mut q = queue();
        q.push(song("a"));
        q.push(song("b"));

        let (first, _) = q.advance().unwrap();
        assert_eq!(first.title, "a");
        assert_eq!(q.current().map(|s| s.title.as_str()), Some("a"));
        assert_eq!(q.pending().map(|s| s.title.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert!(q.is_playing());
    }

    #[test]
    fn advance_on_empty_goes_idle_every_time() {
        let mut q = queue();
        q.push(song("a"));
        q.advance();

        for _ in 0..3 {
            assert!(q.advance().is_none());
            assert!(q.current().is_none());
            assert!(!q.is_playing());
        }
    }

    #[test]
    fn advance_leaves_voice_link_alone() {
        let mut q = queue();
        q.bind(FakeLink::new(ChannelId::new(5)));
        assert!(q.advance().is_none());
        assert!(q.voice_link().is_some());
    }

    #[test]
    fn reset_clears_state_and_returns_link() {
        let mut q = queue();
        q.bind(FakeLink::new(ChannelId::new(5)));
        q.push(song("a"));
        q.push(song("b"));
        q.advance();

        let link = q.reset();
        assert!(link.is_some());
        let snap = q.snapshot();
        assert_eq!(snap.current, None);
        assert!(snap.pending.is_empty());
        assert!(!snap.is_playing);
        assert!(!snap.connected);
    }

    #[test]
    fn stale_epoch_cannot_fail_a_newer_song() {
        let mut q = queue();
        q.push(song("a"));
        q.push(song("b"));
        let (_, first) = q.advance().unwrap();
        let (_, second) = q.advance().unwrap();
        assert!(!q.is_epoch(first));

        q.fail(first);
        assert_eq!(q.current().map(|s| s.title.as_str()), Some("b"));

        q.fail(second);
        assert!(q.current().is_none());
        assert!(!q.is_playing());
    }
}
