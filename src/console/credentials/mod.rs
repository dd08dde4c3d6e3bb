//! Credential store: persisted console users.
//!
//! [`UserRecord`] is the sanitized view handed to everything outside the
//! authenticator. The password hash only travels inside [`StoredCredential`],
//! which the authenticator consumes and drops.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// A console user without any secret material.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ToSchema)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    /// Creation time, unix seconds.
    pub created_at: i64,
}

/// Editable user fields, already validated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

/// A user record together with its password hash.
pub struct StoredCredential {
    user: UserRecord,
    password_hash: String,
}

impl StoredCredential {
    #[must_use]
    pub fn new(user: UserRecord, password_hash: String) -> Self {
        Self {
            user,
            password_hash,
        }
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub(crate) fn into_user(self) -> UserRecord {
        self.user
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of an insert or update against the store.
#[derive(Debug)]
pub enum WriteOutcome {
    Saved(UserRecord),
    /// Username or email already belongs to another user.
    Conflict,
    NotFound,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active user with exactly this username (case-sensitive).
    async fn find_active_by_username(&self, username: &str) -> Result<Option<StoredCredential>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    /// All users, newest first.
    async fn list(&self) -> Result<Vec<UserRecord>>;

    async fn create(&self, profile: &UserProfile, password_hash: &str) -> Result<WriteOutcome>;

    async fn update(&self, id: i64, profile: &UserProfile) -> Result<WriteOutcome>;

    /// Returns `false` when no user has this id.
    async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool>;

    /// Soft delete: the row stays, the user can no longer log in.
    async fn deactivate(&self, id: i64) -> Result<bool>;

    async fn username_exists(&self, username: &str, excluding: Option<i64>) -> Result<bool>;

    async fn email_exists(&self, email: &str, excluding: Option<i64>) -> Result<bool>;
}
