use crate::store::{MainStore, Store};

use async_trait::async_trait;
use serenity::client::Context;
use serenity::model::guild::Member;
use serenity::model::id::{GuildId, RoleId, UserId};

use std::collections::HashSet;
use std::error::Error;

/// The live guild roster, as seen by the reconciler.
///
/// `resolve` answers whether a stored role id still exists in the
/// guild, `grant` applies it to the rejoining member. Grants are
/// best-effort: the reconciler logs failures and moves on, it never
/// retries.
#[async_trait]
pub trait RoleSink {
    type Error: Error;

    async fn resolve(&mut self, role_id: RoleId) -> Result<bool, Self::Error>;

    async fn grant(&mut self, role_id: RoleId) -> Result<(), Self::Error>;
}

/// Re-applies stored roles when a member rejoins a guild.
///
/// Stateless across invocations; every join notification is processed
/// on its own and fully consumed regardless of partial failures.
#[derive(Clone, Debug)]
pub struct Reconciler<S>
where
    S: Store,
{
    store: MainStore<S>,
}

impl<S> Reconciler<S>
where
    S: Store + Clone,
    S::Error: Send + 'static,
{
    pub fn new(store: MainStore<S>) -> Self {
        Self { store }
    }

    /// Handles a member-join notification.
    ///
    /// Reads the member's stored role set and grants every role that
    /// still resolves against the live roster. Roles that no longer
    /// exist are skipped silently. A storage read failure drops the
    /// notification after logging; there is no caller to report to.
    pub async fn member_joined<T>(&self, guild_id: GuildId, user_id: UserId, sink: &mut T)
    where
        T: RoleSink + Send,
    {
        let roles = match self.store.get_roles(guild_id, user_id).await {
            Ok(roles) => roles,
            Err(err) => {
                log::error!(
                    "[RECONCILER] Failed to load stored roles for user {} in guild {}: {:?}",
                    user_id,
                    guild_id,
                    err
                );
                return;
            }
        };

        if roles.is_empty() {
            log::debug!(
                "[RECONCILER] No stored roles for user {} in guild {}",
                user_id,
                guild_id
            );
            return;
        }

        let mut granted = 0;

        for role_id in roles {
            match sink.resolve(role_id).await {
                Ok(true) => match sink.grant(role_id).await {
                    Ok(()) => granted += 1,
                    Err(err) => {
                        log::warn!(
                            "[RECONCILER] Failed to grant role {} to user {} in guild {}: {:?}",
                            role_id,
                            user_id,
                            guild_id,
                            err
                        );
                    }
                },
                // The role was deleted since it was recorded.
                Ok(false) => {
                    log::debug!(
                        "[RECONCILER] Role {} no longer exists in guild {}, skipping",
                        role_id,
                        guild_id
                    );
                }
                Err(err) => {
                    log::warn!(
                        "[RECONCILER] Failed to resolve role {} in guild {}: {:?}",
                        role_id,
                        guild_id,
                        err
                    );
                }
            }
        }

        log::info!(
            "[RECONCILER] Restored {} role(s) for user {} in guild {}",
            granted,
            user_id,
            guild_id
        );
    }
}

/// A [`RoleSink`] over a freshly joined [`Member`].
///
/// The guild role roster is fetched once, on the first `resolve` call.
/// A member with no stored roles never triggers the fetch.
pub struct MemberSink<'a> {
    ctx: &'a Context,
    member: Member,
    roster: Option<HashSet<RoleId>>,
}

impl<'a> MemberSink<'a> {
    pub fn new(ctx: &'a Context, member: Member) -> Self {
        Self {
            ctx,
            member,
            roster: None,
        }
    }

    async fn roster(&mut self) -> Result<&HashSet<RoleId>, serenity::Error> {
        if self.roster.is_none() {
            let roles = self.member.guild_id.roles(&self.ctx.http).await?;

            self.roster = Some(roles.keys().copied().collect());
        }

        Ok(self.roster.as_ref().unwrap())
    }
}

#[async_trait]
impl RoleSink for MemberSink<'_> {
    type Error = serenity::Error;

    async fn resolve(&mut self, role_id: RoleId) -> Result<bool, Self::Error> {
        let roster = self.roster().await?;

        Ok(roster.contains(&role_id))
    }

    async fn grant(&mut self, role_id: RoleId) -> Result<(), Self::Error> {
        self.member.add_role(&self.ctx.http, role_id).await
    }
}
