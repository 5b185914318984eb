use crate::store::{AddRole, Store};

use async_trait::async_trait;
use parking_lot::RwLock;
use serenity::model::id::{GuildId, RoleId, UserId};

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

/// A [`Store`] that keeps all records in memory.
///
/// Nothing is persisted, so this store is only useful for tests.
#[derive(Clone, Debug, Default)]
pub struct MemStore {
    inner: Arc<RwLock<HashMap<(GuildId, UserId), HashSet<RoleId>>>>,
}

#[async_trait]
impl Store for MemStore {
    type Error = Infallible;

    async fn connect(_uri: &str) -> Result<Self, Self::Error> {
        Ok(Self::default())
    }

    async fn create(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn get_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<HashSet<RoleId>, Self::Error> {
        let inner = self.inner.read();

        Ok(inner
            .get(&(guild_id, user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<AddRole, Self::Error> {
        let mut inner = self.inner.write();

        let roles = inner.entry((guild_id, user_id)).or_default();
        match roles.insert(role_id) {
            true => Ok(AddRole::Added),
            false => Ok(AddRole::AlreadyPresent),
        }
    }
}
