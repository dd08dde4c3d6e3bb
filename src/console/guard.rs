//! Access guard: the gate every protected handler passes first.
//!
//! `require_*` return `Ok(Principal)` when the request may continue and an
//! [`AuthError`] that resolves to a redirect otherwise. Handlers propagate the
//! error with `?`, so nothing after the gate runs for a rejected request.

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::{
    error::AuthError,
    role::{satisfies, satisfies_any, Role},
    session::{Activity, Session, SessionManager, SessionUser, Severity},
};

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const ACCESS_DENIED_MESSAGE: &str = "You do not have permission to access this section.";
pub const FORM_EXPIRED_MESSAGE: &str = "The form has expired. Please try again.";

/// Authenticated user context taken from the session snapshot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, ToSchema)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl From<&SessionUser> for Principal {
    fn from(user: &SessionUser) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl SessionManager {
    /// Continue only for an authenticated, non-idle session.
    ///
    /// Anonymous and idle sessions are destroyed; an idle one additionally
    /// leaves a "session expired" flash on the fresh anonymous session.
    pub async fn require_login(&self, session: &mut Session) -> Result<Principal, AuthError> {
        match self.check_activity(session).await? {
            Activity::Active => session
                .user()
                .map(Principal::from)
                .ok_or(AuthError::SessionRequired { expired: false }),
            Activity::Anonymous => {
                if session.id().is_some() {
                    self.destroy_session(session).await?;
                }
                Err(AuthError::SessionRequired { expired: false })
            }
            Activity::Expired => {
                if let Some(user) = session.user() {
                    info!(user_id = user.user_id, username = %user.username, "session expired");
                }
                self.destroy_session(session).await?;
                self.set_flash(session, SESSION_EXPIRED_MESSAGE, Severity::Warning)
                    .await?;
                Err(AuthError::SessionRequired { expired: true })
            }
        }
    }

    /// [`Self::require_login`], then the session role must satisfy `required`.
    pub async fn require_role(
        &self,
        session: &mut Session,
        required: Role,
    ) -> Result<Principal, AuthError> {
        let principal = self.require_login(session).await?;
        if satisfies(required, principal.role) {
            return Ok(principal);
        }
        self.deny(session, &principal).await
    }

    /// [`Self::require_login`], then the session role must satisfy one of `allowed`.
    pub async fn require_any_role(
        &self,
        session: &mut Session,
        allowed: &[Role],
    ) -> Result<Principal, AuthError> {
        let principal = self.require_login(session).await?;
        if satisfies_any(allowed, principal.role) {
            return Ok(principal);
        }
        self.deny(session, &principal).await
    }

    async fn deny(&self, session: &mut Session, principal: &Principal) -> Result<Principal, AuthError> {
        info!(
            user_id = principal.user_id,
            role = %principal.role,
            "access denied"
        );
        self.set_flash(session, ACCESS_DENIED_MESSAGE, Severity::Error)
            .await?;
        Err(AuthError::AuthorizationFailure)
    }

    /// Check a submitted anti-forgery token, leaving an error flash on mismatch.
    pub async fn require_token(&self, session: &mut Session, candidate: &str) -> Result<(), AuthError> {
        if self.verify_token(session, candidate) {
            return Ok(());
        }
        self.set_flash(session, FORM_EXPIRED_MESSAGE, Severity::Error)
            .await?;
        Err(AuthError::TokenMismatch)
    }
}
