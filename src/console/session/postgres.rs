//! PostgreSQL session storage (`console_sessions` table).
//!
//! Only the SHA-256 of a session id is stored; the raw id lives in the
//! client cookie alone.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::Instrument;

use crate::console::db::query_span;

use super::{
    state::SessionState,
    store::SessionStore,
    token::{generate_session_id, hash_session_id},
};

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionState>> {
        let query = "SELECT state::text FROM console_sessions WHERE session_hash = $1";
        let state: Option<String> = sqlx::query_scalar(query)
            .bind(hash_session_id(id))
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup session")?;

        state
            .map(|json| serde_json::from_str(&json).context("failed to decode session state"))
            .transpose()
    }

    async fn set(&self, id: &str, state: &SessionState) -> Result<()> {
        let query = r"
            INSERT INTO console_sessions (session_hash, state, updated_at)
            VALUES ($1, $2::jsonb, NOW())
            ON CONFLICT (session_hash)
            DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()
        ";
        let json = serde_json::to_string(state).context("failed to encode session state")?;
        sqlx::query(query)
            .bind(hash_session_id(id))
            .bind(json)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to store session")?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let query = "DELETE FROM console_sessions WHERE session_hash = $1";
        sqlx::query(query)
            .bind(hash_session_id(id))
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete session")?;

        Ok(())
    }

    async fn rotate(&self, old_id: &str) -> Result<String> {
        let query = r"
            UPDATE console_sessions
            SET session_hash = $2, updated_at = NOW()
            WHERE session_hash = $1
        ";
        let new_id = generate_session_id()?;
        sqlx::query(query)
            .bind(hash_session_id(old_id))
            .bind(hash_session_id(&new_id))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to rotate session id")?;

        Ok(new_id)
    }
}
