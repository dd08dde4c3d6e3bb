//! Serializable per-session state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::console::{credentials::UserRecord, role::Role};

/// Severity of a flash message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

/// One-shot message carried across a redirect.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub message: String,
    pub severity: Severity,
}

/// User snapshot copied from the credential store at login time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    /// Unix seconds.
    pub login_time: i64,
    /// Unix seconds; refreshed on every guarded request.
    pub last_activity: i64,
}

impl SessionUser {
    pub(crate) fn from_record(user: &UserRecord, now: i64) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            role: user.role,
            login_time: now,
            last_activity: now,
        }
    }
}

/// Everything kept server-side for one session id.
///
/// `user` is `None` for anonymous sessions; all user fields come from a
/// single record so they can never disagree with each other.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub flash: Option<Flash>,
}
