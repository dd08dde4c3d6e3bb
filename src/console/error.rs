//! Failure taxonomy for login, session and access checks.
//!
//! Every variant except [`AuthError::Storage`] resolves to a redirect. The
//! redirect only names its target ([`Redirect`]); the session layer turns the
//! target into a `Location` header using the configured paths.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

/// Where a halted request is sent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Redirect {
    /// The configured login page.
    Login,
    /// The configured default page for authenticated users.
    Home,
    /// A fixed console path, e.g. the listing a form was posted from.
    Path(String),
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown user, wrong password or inactive account. Deliberately a single
    /// variant so callers cannot tell the cases apart.
    #[error("invalid username or password")]
    AuthenticationFailure,
    /// Authenticated, but the session role does not satisfy the route.
    #[error("insufficient role")]
    AuthorizationFailure,
    /// No session, or the session was idle for too long.
    #[error("session required")]
    SessionRequired { expired: bool },
    /// A submitted anti-forgery token did not match the session token.
    #[error("anti-forgery token mismatch")]
    TokenMismatch,
    /// Credential or session store failure.
    #[error("storage failure")]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    /// Redirect target for this failure; `None` for storage failures.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::AuthenticationFailure | Self::SessionRequired { .. } => Some(Redirect::Login),
            Self::AuthorizationFailure | Self::TokenMismatch => Some(Redirect::Home),
            Self::Storage(_) => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Some(target) = self.redirect() {
            return target.into_response();
        }

        if let Self::Storage(err) = &self {
            error!("Storage failure: {err:#}");
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal error" })),
        )
            .into_response()
    }
}
