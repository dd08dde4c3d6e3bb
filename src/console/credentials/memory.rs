//! In-process credential store.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, StoredCredential, UserProfile, UserRecord, WriteOutcome};
use crate::console::session::now_unix;

struct Row {
    user: UserRecord,
    password_hash: String,
}

#[derive(Default)]
struct Rows {
    next_id: i64,
    rows: Vec<Row>,
}

impl Rows {
    fn taken(&self, profile: &UserProfile, excluding: Option<i64>) -> bool {
        self.rows.iter().any(|row| {
            Some(row.user.id) != excluding
                && (row.user.username == profile.username || row.user.email == profile.email)
        })
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Rows>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<StoredCredential>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|row| row.user.active && row.user.username == username)
            .map(|row| StoredCredential::new(row.user.clone(), row.password_hash.clone())))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|row| row.user.id == id)
            .map(|row| row.user.clone()))
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let inner = self.inner.read().await;
        // Insertion order doubles as creation order.
        Ok(inner.rows.iter().rev().map(|row| row.user.clone()).collect())
    }

    async fn create(&self, profile: &UserProfile, password_hash: &str) -> Result<WriteOutcome> {
        let mut inner = self.inner.write().await;
        if inner.taken(profile, None) {
            return Ok(WriteOutcome::Conflict);
        }
        inner.next_id += 1;
        let user = UserRecord {
            id: inner.next_id,
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            role: profile.role,
            active: profile.active,
            created_at: now_unix(),
        };
        inner.rows.push(Row {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(WriteOutcome::Saved(user))
    }

    async fn update(&self, id: i64, profile: &UserProfile) -> Result<WriteOutcome> {
        let mut inner = self.inner.write().await;
        if inner.taken(profile, Some(id)) {
            return Ok(WriteOutcome::Conflict);
        }
        let Some(row) = inner.rows.iter_mut().find(|row| row.user.id == id) else {
            return Ok(WriteOutcome::NotFound);
        };
        row.user.username.clone_from(&profile.username);
        row.user.display_name.clone_from(&profile.display_name);
        row.user.email.clone_from(&profile.email);
        row.user.role = profile.role;
        row.user.active = profile.active;
        Ok(WriteOutcome::Saved(row.user.clone()))
    }

    async fn change_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(match inner.rows.iter_mut().find(|row| row.user.id == id) {
            Some(row) => {
                row.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn deactivate(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(match inner.rows.iter_mut().find(|row| row.user.id == id) {
            Some(row) => {
                row.user.active = false;
                true
            }
            None => false,
        })
    }

    async fn username_exists(&self, username: &str, excluding: Option<i64>) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .any(|row| row.user.username == username && Some(row.user.id) != excluding))
    }

    async fn email_exists(&self, email: &str, excluding: Option<i64>) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .any(|row| row.user.email == email && Some(row.user.id) != excluding))
    }
}
