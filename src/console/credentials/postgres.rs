//! PostgreSQL credential store (`users` table).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;

use super::{CredentialStore, StoredCredential, UserProfile, UserRecord, WriteOutcome};
use crate::console::{
    db::{is_unique_violation, query_span},
    role::Role,
};

const USER_COLUMNS: &str = "id, username, display_name, email, role, active, \
     EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix";

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<UserRecord> {
    let role: String = row.get("role");
    let role = role
        .parse::<Role>()
        .map_err(|err| anyhow!("corrupt users row: {err}"))?;
    Ok(UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        email: row.get("email"),
        role,
        active: row.get("active"),
        created_at: row.get("created_at_unix"),
    })
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<StoredCredential>> {
        let query = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users \
             WHERE username = $1 AND active = TRUE LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup login record")?;

        row.map(|row| {
            let user = user_from_row(&row)?;
            Ok(StoredCredential::new(user, row.get("password_hash")))
        })
        .transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to fetch user")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list users")?;

        rows.iter().map(user_from_row).collect()
    }

    async fn create(&self, profile: &UserProfile, password_hash: &str) -> Result<WriteOutcome> {
        let query = format!(
            "INSERT INTO users (username, password_hash, display_name, email, role, active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query(&query)
            .bind(&profile.username)
            .bind(password_hash)
            .bind(&profile.display_name)
            .bind(&profile.email)
            .bind(profile.role.as_str())
            .bind(profile.active)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match result {
            Ok(row) => Ok(WriteOutcome::Saved(user_from_row(&row)?)),
            Err(err) if is_unique_violation(&err) => Ok(WriteOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn update(&self, id: i64, profile: &UserProfile) -> Result<WriteOutcome> {
        let query = format!(
            "UPDATE users SET username = $1, display_name = $2, email = $3, role = $4, active = $5 \
             WHERE id = $6 RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query(&query)
            .bind(&profile.username)
            .bind(&profile.display_name)
            .bind(&profile.email)
            .bind(profile.role.as_str())
            .bind(profile.active)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await;

        match result {
            Ok(Some(row)) => Ok(WriteOutcome::Saved(user_from_row(&row)?)),
            Ok(None) => Ok(WriteOutcome::NotFound),
            Err(err) if is_unique_violation(&err) => Ok(WriteOutcome::Conflict),
            Err(err) => Err(err).context("failed to update user"),
        }
    }

    async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let query = "UPDATE users SET password_hash = $1 WHERE id = $2";
        let result = sqlx::query(query)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to change password")?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: i64) -> Result<bool> {
        let query = "UPDATE users SET active = FALSE WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to deactivate user")?;

        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str, excluding: Option<i64>) -> Result<bool> {
        // NULL exclusion compares as unknown, so `IS DISTINCT FROM` keeps every row.
        let query = "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND id IS DISTINCT FROM $2)";
        let exists: bool = sqlx::query_scalar(query)
            .bind(username)
            .bind(excluding)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to check username")?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str, excluding: Option<i64>) -> Result<bool> {
        let query = "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id IS DISTINCT FROM $2)";
        let exists: bool = sqlx::query_scalar(query)
            .bind(email)
            .bind(excluding)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to check email")?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{password::hash_password, test_db::TestDb};

    fn profile(username: &str, role: Role, active: bool) -> UserProfile {
        UserProfile {
            username: username.to_string(),
            display_name: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            active,
        }
    }

    async fn saved(store: &PgCredentialStore, profile: &UserProfile) -> Result<UserRecord> {
        match store.create(profile, &hash_password("Secret123")?).await? {
            WriteOutcome::Saved(user) => Ok(user),
            other => Err(anyhow!("insert failed: {other:?}")),
        }
    }

    #[tokio::test]
    async fn login_lookup_skips_inactive_users() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgCredentialStore::new(db.pool.clone());
        let alice = saved(&store, &profile("alice", Role::Salesperson, true)).await?;
        saved(&store, &profile("bob", Role::Warehouse, false)).await?;

        let credential = store.find_active_by_username("alice").await?;
        assert!(credential
            .as_ref()
            .is_some_and(|c| c.password_hash().starts_with("$argon2id$")));
        assert_eq!(credential.map(StoredCredential::into_user), Some(alice));
        assert!(store.find_active_by_username("bob").await?.is_none());
        assert!(store.find_active_by_username("Alice").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicates_map_to_conflict() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgCredentialStore::new(db.pool.clone());
        saved(&store, &profile("alice", Role::Administrator, true)).await?;
        let carol = saved(&store, &profile("carol", Role::Warehouse, true)).await?;

        let hash = hash_password("Secret123")?;
        let mut same_email = profile("alice2", Role::Warehouse, true);
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(
            store.create(&same_email, &hash).await?,
            WriteOutcome::Conflict
        ));

        let mut renamed = profile("alice", Role::Warehouse, true);
        renamed.email = carol.email.clone();
        assert!(matches!(
            store.update(carol.id, &renamed).await?,
            WriteOutcome::Conflict
        ));
        assert!(matches!(
            store
                .update(9_999, &profile("nobody", Role::Warehouse, true))
                .await?,
            WriteOutcome::NotFound
        ));
        Ok(())
    }

    #[tokio::test]
    async fn exists_checks_exclude_the_edited_row() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgCredentialStore::new(db.pool.clone());
        let alice = saved(&store, &profile("alice", Role::Administrator, true)).await?;

        assert!(store.username_exists("alice", None).await?);
        assert!(!store.username_exists("alice", Some(alice.id)).await?);
        assert!(store.username_exists("alice", Some(alice.id + 1)).await?);
        assert!(store.email_exists("alice@example.com", None).await?);
        assert!(!store.email_exists("alice@example.com", Some(alice.id)).await?);
        assert!(!store.email_exists("dave@example.com", None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn deactivate_and_change_password_keep_the_row() -> Result<()> {
        let Ok(db) = TestDb::new().await else {
            return Ok(());
        };
        let store = PgCredentialStore::new(db.pool.clone());
        let carol = saved(&store, &profile("carol", Role::Warehouse, true)).await?;
        let dave = saved(&store, &profile("dave", Role::Salesperson, true)).await?;

        let listed: Vec<i64> = store.list().await?.iter().map(|user| user.id).collect();
        assert_eq!(listed, vec![dave.id, carol.id]);

        assert!(store.change_password(carol.id, "$argon2id$replaced").await?);
        let credential = store.find_active_by_username("carol").await?;
        assert_eq!(
            credential.as_ref().map(StoredCredential::password_hash),
            Some("$argon2id$replaced")
        );

        assert!(store.deactivate(carol.id).await?);
        assert!(store.find_active_by_username("carol").await?.is_none());
        assert!(store
            .find_by_id(carol.id)
            .await?
            .is_some_and(|user| !user.active));
        assert!(!store.deactivate(9_999).await?);
        assert!(!store.change_password(9_999, "x").await?);
        Ok(())
    }
}
