//! Session manager: per-client state keyed by an opaque session id.
//!
//! Flow Overview:
//! - The session layer loads the [`Session`] named by the request cookie (or an
//!   unattached anonymous one) before the handler runs.
//! - Handlers call [`SessionManager`] operations; every write is persisted to
//!   the [`SessionStore`] immediately.
//! - After the handler, the layer turns pending [`CookieDirective`]s into
//!   `Set-Cookie` headers.
//!
//! Anonymous sessions are attached lazily: no id is minted and nothing is
//! stored until the first write (flash, token or login).

use anyhow::Result;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::{
    config::ConsoleConfig,
    credentials::UserRecord,
    role::{satisfies, satisfies_any, Role},
};

pub mod cookie;
pub mod layer;
mod postgres;
pub mod state;
mod store;
pub(crate) mod token;

pub use cookie::CookieDirective;
pub use postgres::PgSessionStore;
pub use state::{Flash, SessionState, SessionUser, Severity};
pub use store::{MemorySessionStore, SessionStore};

/// Current unix time in seconds.
#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Result of the lazy idle-timeout check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Activity {
    Anonymous,
    /// Authenticated and within the idle window; `last_activity` was refreshed.
    Active,
    /// Authenticated but idle for longer than the timeout.
    Expired,
}

/// The session bound to one request.
#[derive(Debug, Default)]
pub struct Session {
    id: Option<String>,
    state: SessionState,
    cookies: Vec<CookieDirective>,
}

impl Session {
    /// A fresh anonymous session with no id.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.state.user.as_ref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.user.is_some()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|user| user.user_id)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user().map(|user| user.username.as_str())
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user().map(|user| user.display_name.as_str())
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.user().map(|user| user.email.as_str())
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    #[must_use]
    pub fn login_time(&self) -> Option<i64> {
        self.user().map(|user| user.login_time)
    }

    /// Administrator, or exactly `required`. Always false when anonymous.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.role().is_some_and(|actual| satisfies(required, actual))
    }

    /// Administrator, or any of `allowed`. Always false when anonymous.
    #[must_use]
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role()
            .is_some_and(|actual| satisfies_any(allowed, actual))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Administrator)
    }

    #[must_use]
    pub fn is_salesperson(&self) -> bool {
        self.has_role(Role::Salesperson)
    }

    #[must_use]
    pub fn is_warehouse(&self) -> bool {
        self.has_role(Role::Warehouse)
    }

    /// Drain the cookies this request must set, in the order they were queued.
    pub fn take_cookies(&mut self) -> Vec<CookieDirective> {
        std::mem::take(&mut self.cookies)
    }
}

/// Shared handle to the request session, stored in request extensions.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: ConsoleConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: ConsoleConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Load the session named by `id`. Unknown or missing ids yield an
    /// unattached anonymous session.
    pub async fn load(&self, id: Option<&str>) -> Result<Session> {
        let Some(id) = id else {
            return Ok(Session::anonymous());
        };
        match self.store.get(id).await? {
            Some(state) => Ok(Session {
                id: Some(id.to_string()),
                state,
                cookies: Vec::new(),
            }),
            None => {
                debug!("unknown session id presented");
                Ok(Session::anonymous())
            }
        }
    }

    /// Write the session state, minting an id first when unattached.
    async fn persist(&self, session: &mut Session) -> Result<()> {
        let id = match &session.id {
            Some(id) => id.clone(),
            None => {
                let id = token::generate_session_id()?;
                session.cookies.push(CookieDirective::Issue(id.clone()));
                session.id = Some(id.clone());
                id
            }
        };
        self.store.set(&id, &session.state).await
    }

    /// Anonymous -> Authenticated. Stores the user snapshot and rotates the
    /// session id so an id planted before login is worthless afterwards.
    pub async fn create_session(&self, session: &mut Session, user: &UserRecord) -> Result<()> {
        let now = now_unix();
        let id = match session.id.take() {
            Some(old_id) => self.store.rotate(&old_id).await?,
            None => token::generate_session_id()?,
        };
        session.cookies.push(CookieDirective::Issue(id.clone()));
        session.id = Some(id);
        session.state.user = Some(SessionUser::from_record(user, now));
        self.persist(session).await?;

        info!(
            user_id = user.id,
            username = %user.username,
            "user logged in"
        );

        Ok(())
    }

    /// Any state -> Anonymous. Clears everything, deletes the stored state and
    /// expires the client cookie.
    pub async fn destroy_session(&self, session: &mut Session) -> Result<()> {
        if let Some(user) = session.user() {
            info!(user_id = user.user_id, username = %user.username, "user logged out");
        }
        session.state = SessionState::default();
        session.cookies.push(CookieDirective::Expire);
        if let Some(id) = session.id.take() {
            self.store.delete(&id).await?;
        }
        Ok(())
    }

    /// Lazy idle-timeout check. Refreshes `last_activity` when still active,
    /// making the timeout a sliding window. The cookie is re-issued with a
    /// fresh `Max-Age` so the browser keeps it for as long as the server does.
    pub async fn check_activity(&self, session: &mut Session) -> Result<Activity> {
        let now = now_unix();
        let timeout = self.config.idle_timeout_seconds();
        let Some(user) = session.state.user.as_mut() else {
            return Ok(Activity::Anonymous);
        };
        if now - user.last_activity > timeout {
            return Ok(Activity::Expired);
        }
        user.last_activity = now;
        self.persist(session).await?;
        if let Some(id) = &session.id {
            let issued = session
                .cookies
                .iter()
                .any(|cookie| matches!(cookie, CookieDirective::Issue(_)));
            if !issued {
                session.cookies.push(CookieDirective::Issue(id.clone()));
            }
        }
        Ok(Activity::Active)
    }

    /// Replace any pending flash message.
    pub async fn set_flash(
        &self,
        session: &mut Session,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<()> {
        session.state.flash = Some(Flash {
            message: message.into(),
            severity,
        });
        self.persist(session).await
    }

    /// Return and clear the pending flash message. A message is delivered at
    /// most once.
    pub async fn take_flash(&self, session: &mut Session) -> Result<Option<Flash>> {
        let Some(flash) = session.state.flash.take() else {
            return Ok(None);
        };
        if let Err(err) = self.persist(session).await {
            session.state.flash = Some(flash);
            return Err(err);
        }
        Ok(Some(flash))
    }

    /// The session anti-forgery token, minted on first use and reused after.
    pub async fn generate_token(&self, session: &mut Session) -> Result<String> {
        if let Some(token) = &session.state.csrf_token {
            return Ok(token.clone());
        }
        let token = token::generate_csrf_token()?;
        session.state.csrf_token = Some(token.clone());
        self.persist(session).await?;
        Ok(token)
    }

    /// Constant-time comparison with the session token; false when none exists.
    #[must_use]
    pub fn verify_token(&self, session: &Session, candidate: &str) -> bool {
        session
            .state
            .csrf_token
            .as_deref()
            .is_some_and(|expected| token::tokens_match(expected, candidate))
    }
}
