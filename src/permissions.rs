use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::Permissions;

use std::collections::HashMap;

/// Computes the guild-level permission set of a member.
///
/// The guild owner and members with `ADMINISTRATOR` hold every
/// permission. Everyone else holds the union of the `@everyone` role
/// (whose id equals the guild id) and their assigned roles. Channel
/// overwrites are ignored; they have no effect on role management.
pub fn member_permissions(
    guild_id: GuildId,
    owner_id: UserId,
    user_id: UserId,
    role_ids: &[RoleId],
    roles: &HashMap<RoleId, Permissions>,
) -> Permissions {
    if user_id == owner_id {
        return Permissions::all();
    }

    let everyone = RoleId(guild_id.0);

    let mut permissions = roles.get(&everyone).copied().unwrap_or_else(Permissions::empty);

    for role_id in role_ids {
        if let Some(perms) = roles.get(role_id) {
            permissions |= *perms;
        }
    }

    if permissions.contains(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }

    permissions
}
