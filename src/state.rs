use crate::config::Config;
use crate::reconciler::Reconciler;
use crate::roles::RoleService;
use crate::store::sqlite::SqliteStore;
use crate::store::MainStore;

use std::sync::{Arc, RwLock};
use std::time::Instant;

/// The global shared state.
pub struct State {
    pub config: Arc<RwLock<Config>>,
    store: MainStore<SqliteStore>,
    roles: RoleService<SqliteStore>,
    reconciler: Reconciler<SqliteStore>,
    pub connect_time: Arc<RwLock<Option<Instant>>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the internal [`MainStore`].
    pub fn store(&self) -> &MainStore<SqliteStore> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MainStore<SqliteStore> {
        &mut self.store
    }

    /// Returns a reference to the internal [`RoleService`].
    pub fn roles(&self) -> &RoleService<SqliteStore> {
        &self.roles
    }

    /// Returns a reference to the internal [`Reconciler`].
    pub fn reconciler(&self) -> &Reconciler<SqliteStore> {
        &self.reconciler
    }
}

impl Default for State {
    fn default() -> Self {
        let store = MainStore::default();

        Self {
            config: Arc::default(),
            roles: RoleService::new(store.clone()),
            reconciler: Reconciler::new(store.clone()),
            store,
            connect_time: Arc::default(),
        }
    }
}
