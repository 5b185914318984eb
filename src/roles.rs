use crate::store::{self, AddRole, MainStore, Store};

use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::Permissions;
use thiserror::Error;

/// Outcome of a successful [`RoleService::assign`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Assignment {
    /// The role was written to the member's record.
    Added,
    /// The role was already recorded for the member. Nothing changed.
    AlreadyRecorded,
}

#[derive(Debug, Error)]
pub enum AssignError {
    /// The actor lacks the `MANAGE_ROLES` permission.
    #[error("missing permission to manage roles")]
    Unauthorized,
    /// The member, role or guild id is missing.
    #[error("invalid member or role")]
    InvalidInput,
    /// The underlying store failed.
    #[error("storage unavailable")]
    Store(store::Error),
}

impl From<store::Error> for AssignError {
    fn from(err: store::Error) -> Self {
        Self::Store(err)
    }
}

/// Authorizes and executes requests to record a role for a member.
#[derive(Clone, Debug)]
pub struct RoleService<S>
where
    S: Store,
{
    store: MainStore<S>,
}

impl<S> RoleService<S>
where
    S: Store + Clone,
    S::Error: Send + 'static,
{
    pub fn new(store: MainStore<S>) -> Self {
        Self { store }
    }

    /// Records `role_id` for the member, to be re-applied when the
    /// member rejoins the guild.
    ///
    /// `actor` is the permission set of the caller and must contain
    /// `MANAGE_ROLES`. The permission check runs before input
    /// validation; both run before any store access, so a rejected call
    /// never mutates the record.
    pub async fn assign(
        &self,
        actor: Permissions,
        guild_id: Option<GuildId>,
        user_id: Option<UserId>,
        role_id: Option<RoleId>,
    ) -> Result<Assignment, AssignError> {
        if !actor.contains(Permissions::MANAGE_ROLES) {
            return Err(AssignError::Unauthorized);
        }

        let guild_id = guild_id.ok_or(AssignError::InvalidInput)?;
        let user_id = user_id.ok_or(AssignError::InvalidInput)?;
        let role_id = role_id.ok_or(AssignError::InvalidInput)?;

        let res = self.store.add_role(guild_id, user_id, role_id).await?;

        match res {
            AddRole::Added => {
                log::info!(
                    "[ROLES] Recorded role {} for user {} in guild {}",
                    role_id,
                    user_id,
                    guild_id
                );

                Ok(Assignment::Added)
            }
            AddRole::AlreadyPresent => Ok(Assignment::AlreadyRecorded),
        }
    }
}
