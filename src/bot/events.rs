use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::{debug, info};

use crate::audio::{backend::AudioBackend, player::MusicPlayer};

/// One voice state transition, reduced to what the watcher needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipChange {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub bot_user_id: UserId,
    pub old_channel: Option<ChannelId>,
    pub new_channel: Option<ChannelId>,
}

impl MembershipChange {
    fn is_bot_disconnect(&self) -> bool {
        self.user_id == self.bot_user_id && self.old_channel.is_some() && self.new_channel.is_none()
    }

    fn left(&self, channel_id: ChannelId) -> bool {
        self.old_channel == Some(channel_id) && self.new_channel != Some(channel_id)
    }
}

/// Stops the server's playback when its voice channel has no human left, or
/// when the bot itself was disconnected. `humans_in` counts the non-bot
/// members currently in a channel. Returns whether playback was torn down.
pub async fn handle_membership_change<B, F>(
    player: &MusicPlayer<B>,
    change: &MembershipChange,
    humans_in: F,
) -> bool
where
    B: AudioBackend,
    F: FnOnce(ChannelId) -> usize,
{
    let Some(guild_player) = player.existing(change.guild_id) else {
        return false;
    };

    if change.is_bot_disconnect() {
        // Only the session the event is about; a newer one may already exist.
        let Some(old_channel) = change.old_channel else {
            return false;
        };
        if !guild_player.force_stop_in(old_channel).await {
            debug!(
                "Ignoring stale voice disconnect from {} in guild {}",
                old_channel, change.guild_id
            );
            return false;
        }
        info!(
            "🔌 Bot disconnected from voice in guild {}, playback stopped",
            change.guild_id
        );
        return true;
    }

    let Some(bot_channel) = guild_player.voice_channel().await else {
        return false;
    };

    if !change.left(bot_channel) {
        return false;
    }

    let remaining = humans_in(bot_channel);
    debug!(
        "👥 {} human(s) left in channel {} of guild {}",
        remaining, bot_channel, change.guild_id
    );

    if remaining > 0 || !guild_player.force_stop_in(bot_channel).await {
        return false;
    }

    info!(
        "🚪 Auto-stopped music in guild {}, no users in voice channel",
        change.guild_id
    );
    true
}

/// Whether a voice occupant is a bot. The member attached to the voice
/// state wins over the cached member; unknown users count as humans.
pub fn is_bot_occupant(
    user_id: UserId,
    bot_user_id: UserId,
    state_member_is_bot: Option<bool>,
    cached_member_is_bot: Option<bool>,
) -> bool {
    user_id == bot_user_id
        || state_member_is_bot
            .or(cached_member_is_bot)
            .unwrap_or(false)
}

/// Non-bot occupants of `channel_id`, given `(channel, is_bot)` per voice state.
pub fn count_humans<I>(occupants: I, channel_id: ChannelId) -> usize
where
    I: IntoIterator<Item = (Option<ChannelId>, bool)>,
{
    occupants
        .into_iter()
        .filter(|(channel, is_bot)| *channel == Some(channel_id) && !is_bot)
        .count()
}
