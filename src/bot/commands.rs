use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{
        application::{Command, CommandOptionType},
        id::GuildId,
    },
    prelude::Context,
};

pub fn all() -> Vec<CreateCommand> {
    vec![music_command(), botstats_command()]
}

/// Registers global commands
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    Command::set_global_commands(&ctx.http, all()).await?;
    Ok(())
}

/// Registers commands for a single guild (development)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all()).await?;
    Ok(())
}

fn music_command() -> CreateCommand {
    CreateCommand::new("music")
        .description("Music bot commands")
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "play", "Play a song from YouTube")
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "query",
                        "Song name or YouTube URL",
                    )
                    .required(true),
                ),
        )
        .add_option(subcommand("skip", "Skip the current song"))
        .add_option(subcommand("stop", "Stop playing and clear the queue"))
        .add_option(subcommand("queue", "Show the current queue"))
        .add_option(subcommand("nowplaying", "Show the currently playing song"))
        .add_option(subcommand("pause", "Pause the current song"))
        .add_option(subcommand("resume", "Resume the paused song"))
}

fn botstats_command() -> CreateCommand {
    CreateCommand::new("botstats").description("Show bot statistics and information")
}

fn subcommand(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::SubCommand, name, description)
}
