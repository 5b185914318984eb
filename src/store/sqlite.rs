use crate::store::{AddRole, Store};

use async_trait::async_trait;
use futures::TryStreamExt;
use serenity::model::id::{GuildId, RoleId, UserId};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use std::collections::HashSet;

pub type Error = sqlx::Error;

/// A [`Store`] backed by a local SQLite database.
///
/// Role sets are kept as one row per `(guild_id, user_id, role_id)`
/// triple with a primary key over all three columns. `add_role` is a
/// single `INSERT OR IGNORE`, making the insert-if-absent atomic at the
/// database level without any locking in the bot.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[async_trait]
impl Store for SqliteStore {
    type Error = Error;

    async fn connect(uri: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(uri).await?;

        Ok(Self { pool })
    }

    async fn create(&self) -> Result<(), Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS member_roles (
                guild_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                role_id BIGINT NOT NULL,
                PRIMARY KEY (guild_id, user_id, role_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<HashSet<RoleId>, Error> {
        log::debug!(
            "[SQLITE] Fetching roles for user {} in guild {}",
            user_id,
            guild_id
        );

        let mut rows =
            sqlx::query("SELECT role_id FROM member_roles WHERE guild_id = ? AND user_id = ?")
                .bind(guild_id.0 as i64)
                .bind(user_id.0 as i64)
                .fetch(&self.pool);

        let mut roles = HashSet::new();

        while let Some(row) = rows.try_next().await? {
            let role_id: i64 = row.try_get("role_id")?;

            roles.insert(RoleId(role_id as u64));
        }

        Ok(roles)
    }

    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<AddRole, Error> {
        log::debug!(
            "[SQLITE] Recording role {} for user {} in guild {}",
            role_id,
            user_id,
            guild_id
        );

        let res = sqlx::query(
            "INSERT OR IGNORE INTO member_roles (guild_id, user_id, role_id) VALUES (?, ?, ?)",
        )
        .bind(guild_id.0 as i64)
        .bind(user_id.0 as i64)
        .bind(role_id.0 as i64)
        .execute(&self.pool)
        .await?;

        match res.rows_affected() {
            0 => Ok(AddRole::AlreadyPresent),
            _ => Ok(AddRole::Added),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::store::{AddRole, Store};

    use serenity::model::id::{GuildId, RoleId, UserId};

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Returns a connect uri pointing at a fresh database file.
    fn test_uri() -> String {
        let path = std::env::temp_dir().join(format!(
            "rolekeeper-test-{}-{}.sqlite",
            std::process::id(),
            TEST_ID.fetch_add(1, Ordering::SeqCst)
        ));

        let _ = std::fs::remove_file(&path);

        format!("sqlite://{}?mode=rwc", path.display())
    }

    #[tokio::test]
    async fn test_add_role_idempotent() {
        let store = SqliteStore::connect(&test_uri()).await.unwrap();
        store.create().await.unwrap();

        let (guild, user, role) = (GuildId(1), UserId(2), RoleId(3));

        assert_eq!(
            store.add_role(guild, user, role).await.unwrap(),
            AddRole::Added
        );
        assert_eq!(
            store.add_role(guild, user, role).await.unwrap(),
            AddRole::AlreadyPresent
        );

        let roles = store.get_roles(guild, user).await.unwrap();
        assert_eq!(roles, HashSet::from([role]));
    }

    #[tokio::test]
    async fn test_get_roles_empty() {
        let store = SqliteStore::connect(&test_uri()).await.unwrap();
        store.create().await.unwrap();

        let roles = store.get_roles(GuildId(1), UserId(2)).await.unwrap();
        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn test_records_are_keyed_per_member() {
        let store = SqliteStore::connect(&test_uri()).await.unwrap();
        store.create().await.unwrap();

        store
            .add_role(GuildId(1), UserId(2), RoleId(3))
            .await
            .unwrap();
        store
            .add_role(GuildId(1), UserId(4), RoleId(5))
            .await
            .unwrap();
        store
            .add_role(GuildId(6), UserId(2), RoleId(7))
            .await
            .unwrap();

        let roles = store.get_roles(GuildId(1), UserId(2)).await.unwrap();
        assert_eq!(roles, HashSet::from([RoleId(3)]));
    }

    #[tokio::test]
    async fn test_concurrent_adds_both_survive() {
        let store = SqliteStore::connect(&test_uri()).await.unwrap();
        store.create().await.unwrap();

        let (guild, user) = (GuildId(1), UserId(2));

        let s1 = store.clone();
        let s2 = store.clone();

        let t1 = tokio::spawn(async move { s1.add_role(guild, user, RoleId(3)).await });
        let t2 = tokio::spawn(async move { s2.add_role(guild, user, RoleId(4)).await });

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        let roles = store.get_roles(guild, user).await.unwrap();
        assert!(roles.contains(&RoleId(3)));
        assert!(roles.contains(&RoleId(4)));
    }

    #[tokio::test]
    async fn test_roles_survive_reconnect() {
        let uri = test_uri();

        {
            let store = SqliteStore::connect(&uri).await.unwrap();
            store.create().await.unwrap();
            store
                .add_role(GuildId(1), UserId(2), RoleId(3))
                .await
                .unwrap();
        }

        let store = SqliteStore::connect(&uri).await.unwrap();
        store.create().await.unwrap();

        let roles = store.get_roles(GuildId(1), UserId(2)).await.unwrap();
        assert_eq!(roles, HashSet::from([RoleId(3)]));

        assert_eq!(
            store
                .add_role(GuildId(1), UserId(2), RoleId(3))
                .await
                .unwrap(),
            AddRole::AlreadyPresent
        );
    }
}
