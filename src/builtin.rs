use crate::permissions;
use crate::roles::{AssignError, Assignment};
use crate::state::State;

use chrono::Utc;
use serenity::client::Context;
use serenity::model::channel::Message;
use serenity::model::id::{RoleId, UserId};

use std::sync::Arc;

/// All builtin commands with their help descriptions.
const COMMANDS: &[(&str, &str)] = &[
    (
        "add <member> <role>",
        "Record a role for a member. It is re-applied when the member rejoins.",
    ),
    ("help", "Show this help message."),
    ("ping", "Check the ping of the bot."),
    ("uptime", "Show the bot uptime."),
];

/// The `add` command records a role for a member, requiring the caller
/// to hold the `MANAGE_ROLES` permission. The outcome is reported to
/// the caller via DM so the acknowledgment stays private.
pub async fn add(
    ctx: &Context,
    message: &Message,
    state: &Arc<State>,
    args: &[&str],
) -> serenity::Result<()> {
    let guild_id = match message.guild_id {
        Some(guild_id) => guild_id,
        None => {
            message
                .channel_id
                .say(&ctx.http, ":x: This command can only be used in guilds.")
                .await?;

            return Ok(());
        }
    };

    let member = guild_id.member(ctx, message.author.id).await?;
    let guild = guild_id.to_partial_guild(&ctx.http).await?;
    let roles = guild_id.roles(&ctx.http).await?;

    let role_permissions = roles
        .iter()
        .map(|(id, role)| (*id, role.permissions))
        .collect();

    let actor = permissions::member_permissions(
        guild_id,
        guild.owner_id,
        message.author.id,
        &member.roles,
        &role_permissions,
    );

    let user_id = args.get(0).and_then(|arg| parse_user(arg));

    // Only roles that currently exist in the guild can be recorded.
    let role_id = args
        .get(1)
        .and_then(|arg| parse_role(arg))
        .filter(|role_id| roles.contains_key(role_id));

    let reply = match state
        .roles()
        .assign(actor, Some(guild_id), user_id, role_id)
        .await
    {
        Ok(Assignment::Added) => "Role added to member",
        Ok(Assignment::AlreadyRecorded) => "Role already exists for this member",
        Err(AssignError::Unauthorized) => "You do not have permission to use this command",
        Err(AssignError::InvalidInput) => "Invalid member or role",
        Err(AssignError::Store(err)) => {
            log::error!("[ROLES] Failed to record role: {:?}", err);

            ":warning: Internal Server Error"
        }
    };

    message.author.dm(ctx, |m| m.content(reply)).await?;

    Ok(())
}

/// The `help` command displays a list of all commands.
pub async fn help(ctx: &Context, message: &Message) -> serenity::Result<()> {
    let commands: Vec<String> = COMMANDS
        .iter()
        .map(|(name, description)| format!("`!{}`: {}", name, description))
        .collect();

    message
        .channel_id
        .say(&ctx.http, format!("Commands:\n{}", commands.join("\n")))
        .await?;

    Ok(())
}

/// The `ping` command displays the delay between the message being sent
/// and the bot receiving it.
pub async fn ping(ctx: &Context, message: &Message) -> serenity::Result<()> {
    let latency = Utc::now()
        .signed_duration_since(message.timestamp.with_timezone(&Utc))
        .num_milliseconds();

    message
        .channel_id
        .say(&ctx.http, format!("Ping: {}ms", latency))
        .await?;

    Ok(())
}

/// The `uptime` command displays the time since the bot last connected
/// to the discord gateway.
pub async fn uptime(ctx: &Context, message: &Message, state: &Arc<State>) -> serenity::Result<()> {
    let connect_time = { *state.connect_time.read().unwrap() };

    let description = match connect_time {
        Some(connect_time) => match connect_time.elapsed().as_secs() {
            secs if secs >= 3600 => format!(
                "{} hrs, {} min, {} sec",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ),
            secs if secs >= 60 => format!("{} min, {} sec", secs / 60, secs % 60),
            secs => format!("{} sec", secs),
        },
        None => String::from("Unknown"),
    };

    message
        .channel_id
        .say(&ctx.http, format!("Uptime: {}", description))
        .await?;

    Ok(())
}

/// Parses a user mention (`<@id>` or `<@!id>`) or a raw id.
fn parse_user(s: &str) -> Option<UserId> {
    let s = s
        .strip_prefix("<@")
        .map(|s| s.strip_prefix('!').unwrap_or(s))
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s);

    s.parse().ok().map(UserId)
}

/// Parses a role mention (`<@&id>`) or a raw id.
fn parse_role(s: &str) -> Option<RoleId> {
    let s = s
        .strip_prefix("<@&")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(s);

    s.parse().ok().map(RoleId)
}
