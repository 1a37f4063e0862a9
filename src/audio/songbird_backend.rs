use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{
        codecs::{get_codec_registry, get_probe},
        Input, YoutubeDl,
    },
    tracks::TrackHandle,
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        backend::{AudioBackend, StartedTrack, TrackControl},
        queue::Song,
    },
    error::MusicError,
};

/// Voice session held by a server's queue.
pub struct SongbirdLink {
    channel_id: ChannelId,
    call: Arc<Mutex<Call>>,
}

/// [`AudioBackend`] on top of songbird, with yt-dlp doing the extraction.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    volume: f32,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>, volume: f32) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            volume,
        }
    }
}

#[async_trait]
impl AudioBackend for SongbirdBackend {
    type Link = SongbirdLink;
    type Stream = Input;
    type Track = TrackHandle;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<SongbirdLink, MusicError> {
        match self.manager.join(guild_id, channel_id).await {
            Ok(call) => Ok(SongbirdLink { channel_id, call }),
            Err(e) => {
                error!("Error joining voice in guild {}: {:?}", guild_id, e);
                Err(MusicError::CollaboratorUnavailable(format!(
                    "voice connection: {e}"
                )))
            }
        }
    }

    async fn link_channel(&self, link: &SongbirdLink) -> Option<ChannelId> {
        // The bot may have been dragged to another channel since joining.
        let current = link.call.lock().await.current_channel();
        Some(
            current
                .map(|channel| ChannelId::from(channel.0))
                .unwrap_or(link.channel_id),
        )
    }

    async fn open_stream(&self, song: &Song) -> Result<Input, MusicError> {
        debug!("🔗 Opening stream for {}", song.source_url);

        let input: Input = YoutubeDl::new(self.http.clone(), song.source_url.clone()).into();

        // Probe now so extraction errors surface before the track is handed over.
        input
            .make_playable_async(get_codec_registry(), get_probe())
            .await
            .map_err(|e| MusicError::PlaybackFailure(e.to_string()))
    }

    async fn start(
        &self,
        link: &SongbirdLink,
        stream: Input,
    ) -> Result<StartedTrack<TrackHandle>, MusicError> {
        let handle = link.call.lock().await.play_only_input(stream);

        if let Err(e) = handle.set_volume(self.volume) {
            warn!("Could not set volume: {:?}", e);
        }

        let (tx, rx) = oneshot::channel();
        let notifier = TrackEndNotifier {
            tx: Arc::new(SyncMutex::new(Some(tx))),
        };

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| MusicError::PlaybackFailure(format!("track events: {e}")))?;
        }

        Ok(StartedTrack {
            control: handle,
            finished: rx,
        })
    }

    async fn release(&self, guild_id: GuildId, link: SongbirdLink) {
        drop(link);
        match self.manager.remove(guild_id).await {
            Ok(()) => info!("👋 Left voice in guild {}", guild_id),
            Err(e) => warn!("Error leaving voice in guild {}: {:?}", guild_id, e),
        }
    }
}

impl TrackControl for TrackHandle {
    fn stop(&self) {
        if let Err(e) = TrackHandle::stop(self) {
            debug!("Track already gone on stop: {:?}", e);
        }
    }

    fn pause(&self) {
        if let Err(e) = TrackHandle::pause(self) {
            debug!("Track already gone on pause: {:?}", e);
        }
    }

    fn resume(&self) {
        if let Err(e) = TrackHandle::play(self) {
            debug!("Track already gone on resume: {:?}", e);
        }
    }
}

/// Fires the queue's end-of-track signal once, on end or on error.
#[derive(Clone)]
struct TrackEndNotifier {
    tx: Arc<SyncMutex<Option<oneshot::Sender<()>>>>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _handle) in *tracks {
                debug!("🎵 Track left the driver: {:?}", state.playing);
            }
        }

        let tx = self.tx.lock().take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }

        None
    }
}
