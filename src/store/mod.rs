pub mod mem;
pub mod sqlite;

use async_trait::async_trait;
use serenity::model::id::{GuildId, RoleId, UserId};

use std::collections::HashSet;
use std::error;
use std::fmt::{self, Display, Formatter};
use std::result;
use std::sync::{Arc, RwLock};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(Box<dyn error::Error + Send + 'static>);

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T> From<T> for Error
where
    T: error::Error + Send + 'static,
{
    fn from(err: T) -> Self {
        Self(Box::new(err))
    }
}

/// Outcome of a [`Store::add_role`] call.
///
/// `AlreadyPresent` is not an error, it signals that the call was an
/// idempotent no-op and nothing was written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddRole {
    Added,
    AlreadyPresent,
}

/// A durable mapping of `(guild, member)` to a set of role ids.
///
/// `add_role` must be atomic per `(guild, member)` key: two concurrent
/// additions of different roles for the same member both survive.
#[async_trait]
pub trait Store: Sized {
    type Error: error::Error;

    async fn connect(uri: &str) -> result::Result<Self, Self::Error>;

    /// Creates the backing schema if it doesn't exist yet.
    async fn create(&self) -> result::Result<(), Self::Error>;

    /// Returns all role ids recorded for the member. Returns an empty
    /// set if no record exists.
    async fn get_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> result::Result<HashSet<RoleId>, Self::Error>;

    /// Inserts `role_id` into the member's record, creating the record
    /// if it doesn't exist. Leaves the record unchanged and returns
    /// [`AddRole::AlreadyPresent`] if the role is already recorded.
    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> result::Result<AddRole, Self::Error>;
}

#[derive(Clone, Debug)]
pub struct MainStore<S>
where
    S: Store,
{
    inner: Arc<RwLock<Option<S>>>,
}

impl<S> MainStore<S>
where
    S: Store + Clone,
{
    /// Closes the inner store, resetting it to `None`.
    pub fn close(&self) {
        let mut inner = self.inner.write().unwrap();

        *inner = None;
    }

    pub fn is_connected(&self) -> bool {
        let inner = self.inner.read().unwrap();
        inner.is_some()
    }

    /// Returns a new clone of the inner store.
    ///
    /// # Panics
    /// Panics when the inner store is not connected.
    fn store(&self) -> S {
        let inner = self.inner.read().unwrap();
        let store = inner.as_ref().unwrap();

        store.clone()
    }
}

impl<S> MainStore<S>
where
    S: Store + Clone,
    S::Error: Send + 'static,
{
    pub async fn new(uri: &str) -> Result<Self> {
        let store = S::connect(uri).await?;

        Ok(Self {
            inner: Arc::new(RwLock::new(Some(store))),
        })
    }

    pub async fn connect(&mut self, uri: &str) -> Result<()> {
        let store = S::connect(uri).await?;

        let mut inner = self.inner.write().unwrap();
        *inner = Some(store);

        Ok(())
    }

    pub async fn create(&self) -> Result<()> {
        self.store().create().await?;
        Ok(())
    }

    pub async fn get_roles(&self, guild_id: GuildId, user_id: UserId) -> Result<HashSet<RoleId>> {
        let roles = self.store().get_roles(guild_id, user_id).await?;
        Ok(roles)
    }

    pub async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<AddRole> {
        let res = self.store().add_role(guild_id, user_id, role_id).await?;
        Ok(res)
    }
}

impl<S> Default for MainStore<S>
where
    S: Store,
{
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}
