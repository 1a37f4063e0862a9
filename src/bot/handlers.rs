use anyhow::Result;
use serenity::{
    builder::{CreateInteractionResponse, CreateInteractionResponseMessage},
    model::{
        application::{CommandDataOptionValue, CommandInteraction},
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::{reply::Reply, HarmonyBot, ShardManagerContainer};
use crate::{
    audio::{backend::AudioBackend, player::GuildPlayer},
    error::MusicError,
    sources::{resolve_song, MusicSource},
    stats::{invite_url, GatewayCounts, StatsCollector},
    ui::{
        buttons::{self, NavigationLinks},
        embeds,
    },
};

const NO_MUSIC_PLAYING: &str = "❌ No music is currently playing!";
const QUEUE_EMPTY: &str = "❌ The queue is empty!";

/// Subcommands of `/music`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicCommand {
    Play(String),
    Skip,
    Stop,
    Queue,
    NowPlaying,
    Pause,
    Resume,
}

impl MusicCommand {
    pub fn from_parts(subcommand: &str, query: Option<&str>) -> Option<Self> {
        let command = match subcommand {
            "play" => MusicCommand::Play(query?.to_string()),
            "skip" => MusicCommand::Skip,
            "stop" => MusicCommand::Stop,
            "queue" => MusicCommand::Queue,
            "nowplaying" => MusicCommand::NowPlaying,
            "pause" => MusicCommand::Pause,
            "resume" => MusicCommand::Resume,
            _ => return None,
        };
        Some(command)
    }
}

/// Handles slash commands
pub async fn handle_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &HarmonyBot,
) -> Result<()> {
    info!(
        "📝 Command /{} used by {} in guild {:?}",
        command.data.name, command.user.name, command.guild_id
    );

    match command.data.name.as_str() {
        "music" => handle_music(ctx, command, bot).await,
        "botstats" => handle_botstats(ctx, command, bot).await,
        other => {
            warn!("Unknown command: {}", other);
            respond_ephemeral(ctx, &command, "❌ Unknown command").await
        }
    }
}

async fn handle_music(ctx: &Context, command: CommandInteraction, bot: &HarmonyBot) -> Result<()> {
    let Some(guild_id) = command.guild_id else {
        return respond_ephemeral(ctx, &command, "❌ This command can only be used in a server.")
            .await;
    };

    let Some(music_command) = parse_music_command(&command) else {
        return respond_ephemeral(ctx, &command, "❌ Unknown subcommand").await;
    };

    let player = bot.player.guild(guild_id);

    let reply = match music_command {
        MusicCommand::Play(query) => {
            let Some(channel_id) = requester_voice_channel(ctx, guild_id, command.user.id) else {
                return respond(ctx, &command, Reply::failure(MusicError::NotInVoiceChannel))
                    .await;
            };

            // Search and extraction can outlast the 3 second response window.
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
                )
                .await?;

            let reply = play(
                &player,
                bot.source.as_ref(),
                &query,
                command.user.id,
                channel_id,
            )
            .await;

            command.edit_response(&ctx.http, reply.into_edit()).await?;
            return Ok(());
        }
        MusicCommand::Skip => skip(&player).await,
        MusicCommand::Stop => stop(&player).await,
        MusicCommand::Queue => queue(&player).await,
        MusicCommand::NowPlaying => now_playing(&player).await,
        MusicCommand::Pause => pause(&player).await,
        MusicCommand::Resume => resume(&player).await,
    };

    respond(ctx, &command, reply).await
}

async fn handle_botstats(
    ctx: &Context,
    command: CommandInteraction,
    bot: &HarmonyBot,
) -> Result<()> {
    let latency = shard_latency(ctx).await;
    let counts = gateway_counts(ctx, latency);
    let avatar = ctx.cache.current_user().face();

    let links = NavigationLinks {
        invite: invite_url(bot.config.application_id),
        support_server: bot.config.support_server.clone(),
        dashboard: bot.config.dashboard_url.clone(),
    };

    let reply = bot_stats(&bot.stats, counts, &links, Some(avatar));
    respond(ctx, &command, reply).await
}

pub async fn play<B: AudioBackend>(
    player: &Arc<GuildPlayer<B>>,
    source: &dyn MusicSource,
    query: &str,
    requested_by: UserId,
    channel_id: ChannelId,
) -> Reply {
    let result: Result<Reply, MusicError> = async {
        let song = resolve_song(source, query, requested_by).await?;
        let position = player.enqueue(song.clone(), channel_id).await?;
        Ok(Reply::embed(embeds::track_added_embed(&song, position)))
    }
    .await;

    if let Err(e) = &result {
        warn!("Play failed in guild {}: {}", player.guild_id(), e);
    }

    result.into()
}

pub async fn skip<B: AudioBackend>(player: &Arc<GuildPlayer<B>>) -> Reply {
    player
        .skip()
        .await
        .map(|song| Reply::embed(embeds::skipped_embed(&song)))
        .into()
}

pub async fn stop<B: AudioBackend>(player: &GuildPlayer<B>) -> Reply {
    match player.stop().await {
        Ok(()) => Reply::embed(embeds::stopped_embed()),
        Err(kind) => Reply::failure_with(kind, NO_MUSIC_PLAYING),
    }
}

pub async fn queue<B: AudioBackend>(player: &GuildPlayer<B>) -> Reply {
    let snapshot = player.snapshot().await;

    if snapshot.is_empty() {
        return Reply::failure_with(MusicError::NothingPlaying, QUEUE_EMPTY);
    }

    Reply::embed(embeds::queue_embed(
        snapshot.current.as_ref(),
        &snapshot.pending,
    ))
}

pub async fn now_playing<B: AudioBackend>(player: &GuildPlayer<B>) -> Reply {
    match player.snapshot().await.current {
        Some(song) => Reply::embed(embeds::now_playing_embed(&song)),
        None => Reply::failure(MusicError::NothingPlaying),
    }
}

pub async fn pause<B: AudioBackend>(player: &GuildPlayer<B>) -> Reply {
    match player.pause().await {
        Ok(()) => Reply::embed(embeds::paused_embed()),
        Err(kind) => Reply::failure_with(kind, NO_MUSIC_PLAYING),
    }
}

pub async fn resume<B: AudioBackend>(player: &GuildPlayer<B>) -> Reply {
    match player.resume().await {
        Ok(()) => Reply::embed(embeds::resumed_embed()),
        Err(kind) => Reply::failure_with(kind, NO_MUSIC_PLAYING),
    }
}

pub fn bot_stats(
    stats: &StatsCollector,
    counts: GatewayCounts,
    links: &NavigationLinks,
    avatar_url: Option<String>,
) -> Reply {
    match stats.collect(counts) {
        Ok(stats) => Reply::with_components(
            embeds::stats_embed(&stats, avatar_url),
            vec![buttons::navigation_row(links)],
        ),
        Err(e) => {
            warn!("📊 Stats unavailable: {}", e);
            Reply::failure(e)
        }
    }
}

fn parse_music_command(command: &CommandInteraction) -> Option<MusicCommand> {
    let subcommand = command.data.options.first()?;

    let query = match &subcommand.value {
        CommandDataOptionValue::SubCommand(options) => options
            .iter()
            .find(|opt| opt.name == "query")
            .and_then(|opt| opt.value.as_str()),
        _ => None,
    };

    MusicCommand::from_parts(&subcommand.name, query)
}

/// Voice channel the user sits in, read from the gateway cache.
fn requester_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}

fn gateway_counts(ctx: &Context, latency: Option<std::time::Duration>) -> GatewayCounts {
    let guild_ids = ctx.cache.guilds();

    let mut users = 0;
    let mut channels = 0;
    for guild_id in &guild_ids {
        if let Some(guild) = ctx.cache.guild(*guild_id) {
            users += guild.member_count;
            channels += guild.channels.len();
        }
    }

    GatewayCounts {
        guilds: guild_ids.len(),
        users,
        channels,
        latency_ms: latency.map(|l| l.as_millis()),
    }
}

async fn shard_latency(ctx: &Context) -> Option<std::time::Duration> {
    let manager = ctx.data.read().await.get::<ShardManagerContainer>().cloned()?;
    let runners = manager.runners.lock().await;
    runners.get(&ctx.shard_id).and_then(|runner| runner.latency)
}

async fn respond(ctx: &Context, command: &CommandInteraction, reply: Reply) -> Result<()> {
    command
        .create_response(&ctx.http, reply.into_response())
        .await?;
    Ok(())
}

async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
