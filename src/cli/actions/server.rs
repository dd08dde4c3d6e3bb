use crate::console::{
    self,
    config::ConsoleConfig,
    credentials::PgCredentialStore,
    db,
    session::{MemorySessionStore, PgSessionStore, SessionStore},
    ConsoleState,
};
use anyhow::{anyhow, Result};
use std::{str::FromStr, sync::Arc};
use tracing::{info, warn};
use url::Url;

/// Backend holding session state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionBackend {
    Postgres,
    /// Process memory; sessions are lost on restart.
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("unknown session store: {other}")),
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_store: SessionBackend,
    pub idle_timeout: i64,
    pub cookie_secure: bool,
}

/// DSN safe to log: the password, if any, is masked.
pub(crate) fn redacted_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("****")).is_err() {
                return "<redacted>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<unparsable dsn>".to_string(),
    }
}

/// Handle the server action
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start
pub async fn handle(args: Args) -> Result<()> {
    info!(dsn = %redacted_dsn(&args.dsn), "connecting to database");

    let pool = db::connect(&args.dsn).await?;
    db::apply_schema(&pool).await?;

    let session_store: Arc<dyn SessionStore> = match args.session_store {
        SessionBackend::Postgres => Arc::new(PgSessionStore::new(pool.clone())),
        SessionBackend::Memory => {
            warn!("sessions are kept in memory and will not survive a restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let config = ConsoleConfig::new()
        .with_idle_timeout_seconds(args.idle_timeout)
        .with_cookie_secure(args.cookie_secure);

    let state = Arc::new(ConsoleState::new(
        Arc::new(PgCredentialStore::new(pool.clone())),
        session_store,
        config,
    ));

    console::new(args.port, pool, state).await
}
