//! # Bot Module
//!
//! Discord side of Harmony.
//!
//! This module contains:
//! - Command registration ([`commands`])
//! - The `/music` and `/botstats` dispatcher and handlers ([`handlers`])
//! - The voice membership watcher ([`events`])
//! - The reply type every handler produces ([`reply`])
//!
//! ## Architecture
//!
//! [`HarmonyBot`] implements Serenity's [`EventHandler`]. It owns the
//! [`MusicPlayer`] registry, so commands, membership changes and track
//! completions all reach the same per-server queue.

use anyhow::Result;
use serenity::{
    all::{
        ChannelId, Context, EventHandler, Guild, GuildId, Interaction, Ready, UnavailableGuild,
        UserId, VoiceState,
    },
    async_trait,
    gateway::ShardManager,
    prelude::TypeMapKey,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod events;
pub mod handlers;
pub mod reply;

use crate::{
    audio::{player::MusicPlayer, songbird_backend::SongbirdBackend},
    config::Config,
    sources::MusicSource,
    stats::StatsCollector,
};
use events::MembershipChange;

/// Shard manager stored in the client data, read for gateway latency.
pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<ShardManager>;
}

/// Main Discord event handler.
pub struct HarmonyBot {
    /// Bot configuration loaded from environment variables
    config: Arc<Config>,
    /// Per-server playback queues
    pub player: Arc<MusicPlayer<SongbirdBackend>>,
    /// Search and metadata provider
    source: Arc<dyn MusicSource>,
    stats: StatsCollector,
}

impl HarmonyBot {
    pub fn new(
        config: Config,
        player: Arc<MusicPlayer<SongbirdBackend>>,
        source: Arc<dyn MusicSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            player,
            source,
            stats: StatsCollector::new(),
        }
    }

    /// Registers slash commands, per guild when `GUILD_ID` is set (instant
    /// propagation) or globally otherwise.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registering slash commands...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ Bot is not a member of configured guild {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id)
                    .await
                    .map_err(|e| {
                        error!("❌ Error registering guild commands: {:?}", e);
                        anyhow::anyhow!("Could not register guild commands. Check the bot has the 'applications.commands' scope in that guild.")
                    })?;
                info!("✅ Guild commands registered for {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registering global commands: {:?}", e);
                    anyhow::anyhow!("Could not register global commands. Check the bot has the 'applications.commands' scope.")
                })?;
                info!("✅ Global commands registered");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for HarmonyBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} is online!", ready.user.name);
        info!("📊 Connected to {} servers", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error registering commands: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if let Err(e) = handlers::handle_command(&ctx, command, self).await {
                error!("Error handling command: {:?}", e);
            }
        }
    }

    /// Feeds voice membership changes to the watcher, which stops playback
    /// when the bot's channel is left without listeners.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };

        let bot_user_id = ctx.cache.current_user().id;
        let change = MembershipChange {
            guild_id,
            user_id: new.user_id,
            bot_user_id,
            old_channel: old.as_ref().and_then(|state| state.channel_id),
            new_channel: new.channel_id,
        };

        let Some(occupants) = voice_occupants(&ctx, guild_id, bot_user_id) else {
            debug!("Guild {} not cached, ignoring voice update", guild_id);
            return;
        };

        events::handle_membership_change(&self.player, &change, |channel| {
            events::count_humans(occupants, channel)
        })
        .await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // `unavailable` means an outage, not a removal.
        if incomplete.unavailable {
            return;
        }

        self.player.evict(incomplete.id).await;
    }
}

/// `(channel, is_bot)` for every voice state of the guild.
fn voice_occupants(
    ctx: &Context,
    guild_id: GuildId,
    bot_user_id: UserId,
) -> Option<Vec<(Option<ChannelId>, bool)>> {
    let guild = ctx.cache.guild(guild_id)?;

    let occupants = guild
        .voice_states
        .values()
        .map(|state| {
            let is_bot = events::is_bot_occupant(
                state.user_id,
                bot_user_id,
                state.member.as_ref().map(|member| member.user.bot),
                guild.members.get(&state.user_id).map(|m| m.user.bot),
            );
            (state.channel_id, is_bot)
        })
        .collect();

    Some(occupants)
}
