//! Session storage: a key-value store from session id to [`SessionState`].
//!
//! Each call is atomic from the session manager's point of view. Concurrent
//! requests carrying the same id may race; the last write wins.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{state::SessionState, token::generate_session_id};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<SessionState>>;

    async fn set(&self, id: &str, state: &SessionState) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Move the state stored under `old_id` to a freshly minted id and
    /// invalidate `old_id`. Returns the new id.
    async fn rotate(&self, old_id: &str) -> Result<String> {
        let new_id = generate_session_id()?;
        if let Some(state) = self.get(old_id).await? {
            self.set(&new_id, &state).await?;
        }
        self.delete(old_id).await?;
        Ok(new_id)
    }
}

/// Process-local session storage.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionState>> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn set(&self, id: &str, state: &SessionState) -> Result<()> {
        self.sessions
            .lock()
            .await
            .insert(id.to_string(), state.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }

    async fn rotate(&self, old_id: &str) -> Result<String> {
        let new_id = generate_session_id()?;
        let mut sessions = self.sessions.lock().await;
        if let Some(state) = sessions.remove(old_id) {
            sessions.insert(new_id.clone(), state);
        }
        Ok(new_id)
    }
}
