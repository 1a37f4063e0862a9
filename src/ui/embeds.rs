use num_format::{Locale, ToFormattedString};
use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::{
    audio::queue::{QueuePosition, Song},
    stats::BotStats,
};

/// Standard color palette for the bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::new(0x00ff00);
    pub const WARNING_ORANGE: Colour = Colour::new(0xff9900);
    pub const ERROR_RED: Colour = Colour::new(0xff0000);
    pub const INFO_BLUE: Colour = Colour::new(0x0099ff);
    pub const BLURPLE: Colour = Colour::new(0x5865f2);
}

/// Upcoming songs listed before the listing is cut short.
pub const QUEUE_PREVIEW_LEN: usize = 10;

const STANDARD_FOOTER: &str = "🎵 Harmony";

/// Creates an embed announcing an added song
pub fn track_added_embed(song: &Song, position: QueuePosition) -> CreateEmbed {
    let position = match position {
        QueuePosition::NowPlaying => "Now playing".to_string(),
        QueuePosition::Queued(n) => n.to_string(),
    };

    with_thumbnail(
        CreateEmbed::default()
            .title("🎵 Song Added to Queue")
            .description(format!("**{}**", song.title))
            .url(&song.source_url)
            .color(colors::SUCCESS_GREEN)
            .field("Duration", format_duration(song.duration_secs), true)
            .field("Position in queue", position, true)
            .field("Requested by", format!("<@{}>", song.requested_by), true)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
            .timestamp(Timestamp::now()),
        song,
    )
}

pub fn now_playing_embed(song: &Song) -> CreateEmbed {
    with_thumbnail(
        CreateEmbed::default()
            .title("🎵 Now Playing")
            .description(format!("**{}**", song.title))
            .url(&song.source_url)
            .color(colors::SUCCESS_GREEN)
            .field("Duration", format_duration(song.duration_secs), true)
            .field("Requested by", format!("<@{}>", song.requested_by), true)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER)),
        song,
    )
}

pub fn skipped_embed(song: &Song) -> CreateEmbed {
    CreateEmbed::default()
        .title("⏭️ Song Skipped")
        .description(format!("Skipped: **{}**", song.title))
        .color(colors::WARNING_ORANGE)
}

pub fn stopped_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("⏹️ Music Stopped")
        .description("Stopped playing and cleared the queue.")
        .color(colors::ERROR_RED)
}

pub fn paused_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("⏸️ Music Paused")
        .description("Music has been paused.")
        .color(colors::WARNING_ORANGE)
}

pub fn resumed_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("▶️ Music Resumed")
        .description("Music has been resumed.")
        .color(colors::SUCCESS_GREEN)
}

pub fn queue_embed(current: Option<&Song>, pending: &[Song]) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Music Queue")
        .description(queue_listing(current, pending))
        .color(colors::INFO_BLUE)
}

/// Current song plus the first [`QUEUE_PREVIEW_LEN`] upcoming titles.
pub fn queue_listing(current: Option<&Song>, pending: &[Song]) -> String {
    let mut listing = String::new();

    if let Some(song) = current {
        listing.push_str(&format!("**Now Playing:**\n🎵 {}\n\n", song.title));
    }

    if !pending.is_empty() {
        listing.push_str("**Up Next:**\n");
        for (index, song) in pending.iter().take(QUEUE_PREVIEW_LEN).enumerate() {
            listing.push_str(&format!("{}. {}\n", index + 1, song.title));
        }

        if pending.len() > QUEUE_PREVIEW_LEN {
            listing.push_str(&format!(
                "\n...and {} more songs",
                pending.len() - QUEUE_PREVIEW_LEN
            ));
        }
    }

    listing
}

/// `botstats` embed
pub fn stats_embed(stats: &BotStats, avatar_url: Option<String>) -> CreateEmbed {
    let counts = &stats.counts;
    let host = &stats.host;

    let latency = counts
        .latency_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "N/A".to_string());

    let mut description = String::new();
    description.push_str(&format!(
        "❒ Total guilds: {}\n",
        counts.guilds.to_formatted_string(&Locale::en)
    ));
    description.push_str(&format!(
        "❒ Total users: {}\n",
        counts.users.to_formatted_string(&Locale::en)
    ));
    description.push_str(&format!(
        "❒ Total channels: {}\n",
        counts.channels.to_formatted_string(&Locale::en)
    ));
    description.push_str(&format!("❒ Websocket Ping: {}\n", latency));

    let cpu = format!(
        "❯ **OS:** {} [{}]\n❯ **Cores:** {}\n❯ **Usage:** {:.1}%",
        host.os, host.arch, host.cores, host.process_cpu_percent
    );
    let bot_ram = format!(
        "❯ **Used:** {}\n❯ **Available:** {}\n❯ **Usage:** {:.1}%",
        format_megabytes(host.process_memory),
        format_gigabytes(host.total_memory),
        percent(host.process_memory, host.total_memory)
    );
    let overall_ram = format!(
        "❯ **Used:** {}\n❯ **Available:** {}\n❯ **Usage:** {:.0}%",
        format_gigabytes(host.used_memory),
        format_gigabytes(host.total_memory),
        percent(host.used_memory, host.total_memory).floor()
    );

    let mut embed = CreateEmbed::default()
        .title("Bot Information")
        .color(colors::BLURPLE)
        .description(description)
        .field("CPU", cpu, true)
        .field("Bot's RAM", bot_ram, true)
        .field("Overall RAM", overall_ram, true)
        .field("Version", stats.version, false)
        .field(
            "Uptime",
            format!("```{}```", crate::stats::format_uptime(host.uptime)),
            false,
        );

    if let Some(avatar) = avatar_url {
        embed = embed.thumbnail(avatar);
    }

    embed
}

/// Formats a duration in human readable form
pub fn format_duration(duration_secs: Option<u64>) -> String {
    let total_seconds = match duration_secs {
        Some(secs) if secs > 0 => secs,
        _ => return "Unknown".to_string(),
    };

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn with_thumbnail(embed: CreateEmbed, song: &Song) -> CreateEmbed {
    match &song.thumbnail_url {
        Some(thumbnail) => embed.thumbnail(thumbnail),
        None => embed,
    }
}

fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

fn format_gigabytes(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
