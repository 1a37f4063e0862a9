pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::UserId;
use tracing::{info, warn};

use crate::{audio::queue::Song, error::MusicError};

pub use youtube::YouTubeClient;

/// Metadata of one video as reported by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub url: String,
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
}

impl TrackMetadata {
    pub fn into_song(self, requested_by: UserId) -> Song {
        Song {
            title: self.title,
            source_url: self.url,
            duration_secs: self.duration_secs,
            thumbnail_url: self.thumbnail,
            requested_by,
        }
    }
}

/// Common trait for music sources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicSource: Send + Sync {
    /// Searches the source, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackMetadata>>;

    /// Fetches a single video by URL.
    async fn get_track(&self, url: &str) -> Result<TrackMetadata>;

    /// Whether `url` points at a video this source can fetch directly.
    fn is_valid_url(&self, url: &str) -> bool;

    fn source_name(&self) -> &'static str;
}

/// Turns a free-text query or a video URL into a [`Song`].
pub async fn resolve_song(
    source: &dyn MusicSource,
    query: &str,
    requested_by: UserId,
) -> Result<Song, MusicError> {
    let query = query.trim();

    let metadata = if source.is_valid_url(query) {
        source.get_track(query).await.map_err(|e| {
            warn!("{} lookup failed for {}: {:?}", source.source_name(), query, e);
            MusicError::PlaybackFailure(e.to_string())
        })?
    } else {
        source
            .search(query, 1)
            .await
            .map_err(|e| {
                warn!("{} search failed for {}: {:?}", source.source_name(), query, e);
                MusicError::PlaybackFailure(e.to_string())
            })?
            .into_iter()
            .next()
            .ok_or_else(|| MusicError::NoResultsFound(query.to_string()))?
    };

    info!("🔍 Resolved `{}` to {}", query, metadata.title);
    Ok(metadata.into_song(requested_by))
}

/// Whole seconds, or `None` when the source reported no usable length.
pub fn whole_seconds(duration: Option<f64>) -> Option<u64> {
    duration
        .filter(|secs| secs.is_finite() && *secs >= 0.5)
        .map(|secs| secs.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn metadata(title: &str) -> TrackMetadata {
        TrackMetadata {
            title: title.to_string(),
            url: format!("https://www.youtube.com/watch?v={title}"),
            duration_secs: Some(200),
            thumbnail: Some("https://i.ytimg.com/vi/x/hq.jpg".to_string()),
        }
    }

    fn source_for(is_url: bool) -> MockMusicSource {
        let mut source = MockMusicSource::new();
        source.expect_is_valid_url().return_const(is_url);
        source.expect_source_name().return_const("YouTube");
        source
    }

    #[tokio::test]
    async fn urls_skip_the_search() {
        let mut source = source_for(true);
        source
            .expect_get_track()
            .with(eq("https://youtu.be/abc"))
            .times(1)
            .returning(|_| Ok(metadata("abc")));
        source.expect_search().never();

        let song = resolve_song(&source, " https://youtu.be/abc ", UserId::new(9))
            .await
            .unwrap();
        assert_eq!(song.title, "abc");
        assert_eq!(song.requested_by, UserId::new(9));
        assert_eq!(song.duration_secs, Some(200));
    }

    #[tokio::test]
    async fn search_takes_the_first_hit() {
        let mut source = source_for(false);
        source
            .expect_search()
            .with(eq("never gonna"), eq(1))
            .returning(|_, _| Ok(vec![metadata("first"), metadata("second")]));

        let song = resolve_song(&source, "never gonna", UserId::new(9))
            .await
            .unwrap();
        assert_eq!(song.title, "first");
    }

    #[tokio::test]
    async fn empty_search_is_no_results() {
        let mut source = source_for(false);
        source.expect_search().returning(|_, _| Ok(Vec::new()));

        let err = resolve_song(&source, "zzzz", UserId::new(9)).await.unwrap_err();
        assert_eq!(err, MusicError::NoResultsFound("zzzz".to_string()));
    }

    #[tokio::test]
    async fn extractor_errors_are_playback_failures() {
        let mut source = source_for(true);
        source
            .expect_get_track()
            .returning(|_| Err(anyhow::anyhow!("Video unavailable")));

        let err = resolve_song(&source, "https://youtu.be/gone", UserId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::PlaybackFailure(msg) if msg.contains("unavailable")));
    }

    #[test]
    fn durations_round_to_whole_seconds() {
        assert_eq!(whole_seconds(Some(212.6)), Some(213));
        assert_eq!(whole_seconds(Some(0.0)), None);
        assert_eq!(whole_seconds(Some(f64::NAN)), None);
        assert_eq!(whole_seconds(None), None);
    }
}
