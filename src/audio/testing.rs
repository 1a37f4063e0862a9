//! In-memory voice backend for exercising the playback state machine.

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::{oneshot, Semaphore};

use crate::{
    audio::{
        backend::{AudioBackend, StartedTrack, TrackControl},
        queue::Song,
    },
    error::MusicError,
};

pub fn song(title: &str) -> Song {
    Song {
        title: title.to_string(),
        source_url: format!("https://www.youtube.com/watch?v={title}"),
        duration_secs: Some(180),
        thumbnail_url: None,
        requested_by: UserId::new(42),
    }
}

/// Lets spawned playback tasks run until they block.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

pub struct FakeLink {
    pub channel_id: ChannelId,
}

impl FakeLink {
    pub fn new(channel_id: ChannelId) -> Self {
        Self { channel_id }
    }
}

struct TrackState {
    title: String,
    finished: Mutex<Option<oneshot::Sender<()>>>,
    paused: AtomicBool,
    stopped: AtomicBool,
}

#[derive(Clone)]
pub struct FakeTrack(Arc<TrackState>);

impl FakeTrack {
    pub fn title(&self) -> &str {
        &self.0.title
    }

    pub fn is_paused(&self) -> bool {
        self.0.paused.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Plays the track out to its natural end.
    pub fn finish(&self) {
        if let Some(tx) = self.0.finished.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl TrackControl for FakeTrack {
    fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.finish();
    }

    fn pause(&self) {
        self.0.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.0.paused.store(false, Ordering::SeqCst);
    }
}

pub struct FakeBackend {
    connects: Mutex<Vec<ChannelId>>,
    releases: Mutex<Vec<GuildId>>,
    tracks: Mutex<Vec<FakeTrack>>,
    broken_urls: Mutex<HashSet<String>>,
    refuse_connect: AtomicBool,
    hold_streams: AtomicBool,
    gate: Semaphore,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            connects: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            broken_urls: Mutex::new(HashSet::new()),
            refuse_connect: AtomicBool::new(false),
            hold_streams: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    pub fn connects(&self) -> Vec<ChannelId> {
        self.connects.lock().clone()
    }

    pub fn releases(&self) -> Vec<GuildId> {
        self.releases.lock().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.tracks.lock().iter().map(|t| t.title().to_string()).collect()
    }

    pub fn last_track(&self) -> Option<FakeTrack> {
        self.tracks.lock().last().cloned()
    }

    pub fn break_stream(&self, song: &Song) {
        self.broken_urls.lock().insert(song.source_url.clone());
    }

    pub fn refuse_connections(&self) {
        self.refuse_connect.store(true, Ordering::SeqCst);
    }

    /// Stream fetches block until [`FakeBackend::release_streams`].
    pub fn hold_streams(&self) {
        self.hold_streams.store(true, Ordering::SeqCst);
    }

    pub fn release_streams(&self) {
        self.hold_streams.store(false, Ordering::SeqCst);
        self.gate.add_permits(64);
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    type Link = FakeLink;
    type Stream = Song;
    type Track = FakeTrack;

    async fn connect(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<FakeLink, MusicError> {
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(MusicError::CollaboratorUnavailable("voice gateway".into()));
        }
        self.connects.lock().push(channel_id);
        Ok(FakeLink::new(channel_id))
    }

    async fn link_channel(&self, link: &FakeLink) -> Option<ChannelId> {
        Some(link.channel_id)
    }

    async fn open_stream(&self, song: &Song) -> Result<Song, MusicError> {
        if self.hold_streams.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
        if self.broken_urls.lock().contains(&song.source_url) {
            return Err(MusicError::PlaybackFailure("video unavailable".into()));
        }
        Ok(song.clone())
    }

    async fn start(
        &self,
        _link: &FakeLink,
        stream: Song,
    ) -> Result<StartedTrack<FakeTrack>, MusicError> {
        let (tx, rx) = oneshot::channel();
        let track = FakeTrack(Arc::new(TrackState {
            title: stream.title,
            finished: Mutex::new(Some(tx)),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }));
        self.tracks.lock().push(track.clone());
        Ok(StartedTrack {
            control: track,
            finished: rx,
        })
    }

    async fn release(&self, guild_id: GuildId, _link: FakeLink) {
        self.releases.lock().push(guild_id);
    }
}
