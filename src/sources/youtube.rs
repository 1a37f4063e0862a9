use anyhow::{Context, Result};
use async_process::Command;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{whole_seconds, MusicSource, TrackMetadata};

static YOUTUBE_VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.|m\.)?(youtube\.com/(watch\?v=|embed/|v/|shorts/)|youtu\.be/|music\.youtube\.com/watch\?v=)[\w-]{6,}",
    )
    .expect("valid YouTube URL pattern")
});

/// Client for YouTube through yt-dlp
pub struct YouTubeClient {
    // Caps concurrent processes to avoid rate limiting
    rate_limiter: Semaphore,
}

/// Information extracted by yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: String,
    duration: Option<f64>,
    thumbnail: Option<String>,
    thumbnails: Option<Vec<YtDlpThumbnail>>,
    webpage_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: String,
}

impl YouTubeClient {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            rate_limiter: Semaphore::new(max_concurrent),
        }
    }

    pub fn is_youtube_url(url: &str) -> bool {
        YOUTUBE_VIDEO_URL.is_match(url)
    }

    /// Version of the installed yt-dlp, used by the health check.
    pub async fn ytdlp_version() -> Result<String> {
        let output = Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await
            .context("yt-dlp is not installed or not in PATH")?;

        if !output.status.success() {
            anyhow::bail!("yt-dlp --version exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<String> {
        let _permit = self.rate_limiter.acquire().await?;

        let output = Command::new("yt-dlp")
            .args(args)
            .output()
            .await
            .context("Error running yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_lines(stdout: &str) -> Vec<TrackMetadata> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<YtDlpInfo>(line) {
            Ok(info) => Some(info.into()),
            Err(e) => {
                debug!("Skipping unparsable yt-dlp line: {}", e);
                None
            }
        })
        .collect()
}

impl From<YtDlpInfo> for TrackMetadata {
    fn from(info: YtDlpInfo) -> Self {
        // Flat search results carry the watch URL in `url` and no `webpage_url`.
        let url = info
            .webpage_url
            .or(info.url.filter(|u| u.starts_with("http")))
            .or(info.id.map(|id| format!("https://www.youtube.com/watch?v={id}")))
            .unwrap_or_default();

        let thumbnail = info.thumbnail.or_else(|| {
            info.thumbnails
                .and_then(|thumbs| thumbs.into_iter().next().map(|t| t.url))
        });

        TrackMetadata {
            title: info.title,
            url,
            duration_secs: whole_seconds(info.duration),
            thumbnail,
        }
    }
}

#[async_trait::async_trait]
impl MusicSource for YouTubeClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackMetadata>> {
        info!("🔍 Searching YouTube: {}", query);

        let search_query = format!("ytsearch{}:{}", limit, query);
        let stdout = self
            .run_ytdlp(&[
                "--no-playlist",
                "--dump-json",
                "--flat-playlist",
                "--skip-download",
                "--no-warnings",
                &search_query,
            ])
            .await?;

        Ok(parse_lines(&stdout))
    }

    async fn get_track(&self, url: &str) -> Result<TrackMetadata> {
        debug!("📊 Fetching video info: {}", url);

        let stdout = self
            .run_ytdlp(&["--no-playlist", "--dump-json", "--no-warnings", url])
            .await?;

        let info: YtDlpInfo =
            serde_json::from_str(stdout.trim()).context("Error parsing yt-dlp output")?;

        let mut metadata = TrackMetadata::from(info);
        if metadata.url.is_empty() {
            metadata.url = url.to_string();
        }
        Ok(metadata)
    }

    fn is_valid_url(&self, url: &str) -> bool {
        Self::is_youtube_url(url)
    }

    fn source_name(&self) -> &'static str {
        "YouTube"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_youtube_url_detection() {
        assert!(YouTubeClient::is_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(YouTubeClient::is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(YouTubeClient::is_youtube_url(
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(YouTubeClient::is_youtube_url("youtube.com/shorts/abcdefgh"));
        assert!(!YouTubeClient::is_youtube_url("https://example.com/video"));
        assert!(!YouTubeClient::is_youtube_url("never gonna give you up"));
    }

    #[test]
    fn flat_search_lines_become_metadata() {
        let stdout = concat!(
            r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","duration":212.0,"url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ","thumbnails":[{"url":"https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg"}]}"#,
            "\n",
            "not json\n",
            r#"{"id":"live123","title":"Lofi radio","duration":null}"#,
            "\n"
        );

        let results = parse_lines(stdout);
        assert_eq!(
            results,
            vec![
                TrackMetadata {
                    title: "Never Gonna Give You Up".to_string(),
                    url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                    duration_secs: Some(212),
                    thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg".to_string()),
                },
                TrackMetadata {
                    title: "Lofi radio".to_string(),
                    url: "https://www.youtube.com/watch?v=live123".to_string(),
                    duration_secs: None,
                    thumbnail: None,
                },
            ]
        );
    }

    #[test]
    fn full_info_prefers_webpage_url_and_thumbnail() {
        let info: YtDlpInfo = serde_json::from_str(
            r#"{"id":"x","title":"Song","duration":61.4,"thumbnail":"https://t/maxres.jpg",
                "webpage_url":"https://www.youtube.com/watch?v=x",
                "url":"https://rr3---sn.googlevideo.com/videoplayback"}"#,
        )
        .unwrap();

        let metadata = TrackMetadata::from(info);
        assert_eq!(metadata.url, "https://www.youtube.com/watch?v=x");
        assert_eq!(metadata.thumbnail.as_deref(), Some("https://t/maxres.jpg"));
        assert_eq!(metadata.duration_secs, Some(61));
    }
}
