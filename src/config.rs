use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // For development commands

    // Audio
    pub default_volume: f32,

    // botstats links
    pub support_server: Option<String>,
    pub dashboard_url: Option<String>,

    // Performance
    pub ytdlp_concurrency: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?,
            application_id: std::env::var("APPLICATION_ID")
                .context("APPLICATION_ID is not set")?
                .parse()
                .context("APPLICATION_ID must be a numeric id")?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()
                .context("DEFAULT_VOLUME must be a number")?,

            support_server: optional_var("SUPPORT_SERVER"),
            dashboard_url: optional_var("DASHBOARD_URL"),

            ytdlp_concurrency: match std::env::var("YTDLP_CONCURRENCY") {
                Ok(val) if !val.trim().is_empty() => val
                    .trim()
                    .parse()
                    .context("YTDLP_CONCURRENCY must be a positive integer")?,
                _ => 3,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token must not be empty
    /// - Volume must be between 0.0 and 2.0
    /// - At least one yt-dlp process must be allowed
    /// - Link buttons need absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        if self.ytdlp_concurrency == 0 {
            anyhow::bail!("YTDLP_CONCURRENCY must be greater than 0");
        }

        for (name, link) in [
            ("SUPPORT_SERVER", &self.support_server),
            ("DASHBOARD_URL", &self.dashboard_url),
        ] {
            if let Some(link) = link {
                let parsed = url::Url::parse(link)
                    .with_context(|| format!("{} is not a valid URL: {}", name, link))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("{} must be an http(s) URL, got: {}", name, link);
                }
            }
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging, without
    /// the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (Guild: {})\n  \
            Audio: {}% vol\n  \
            yt-dlp: {} concurrent\n  \
            Links: support={}, dashboard={}",
            self.application_id,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            (self.default_volume * 100.0).round() as u32,
            self.ytdlp_concurrency,
            self.support_server.is_some(),
            self.dashboard_url.is_some(),
        )
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            application_id: 0,
            guild_id: None,

            default_volume: 0.5,

            support_server: None,
            dashboard_url: None,

            ytdlp_concurrency: 3,
        }
    }
}
