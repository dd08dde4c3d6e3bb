//! Request middleware binding a [`Session`] to every console request.

use axum::{
    extract::{Request, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use super::{cookie, SessionHandle};
use crate::console::{
    config::ConsoleConfig,
    error::{AuthError, Redirect},
    ConsoleState,
};

/// Load the session before the handler and write `Location`/`Set-Cookie`
/// afterwards.
pub async fn session_layer(
    State(state): State<Arc<ConsoleState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = state.config();
    let id = cookie::extract_session_id(request.headers(), config.cookie_name());
    let session = match state.sessions().load(id.as_deref()).await {
        Ok(session) => session,
        Err(err) => return AuthError::Storage(err).into_response(),
    };

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    if let Some(target) = response.extensions_mut().remove::<Redirect>() {
        match HeaderValue::from_str(&location(&target, config)) {
            Ok(value) => {
                response.headers_mut().insert(LOCATION, value);
            }
            Err(err) => error!("Invalid redirect location: {err}"),
        }
    }

    let directives = handle.lock().await.take_cookies();
    for directive in &directives {
        match cookie::render(directive, config) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => error!("Failed to render session cookie: {err}"),
        }
    }

    response
}

fn location(target: &Redirect, config: &ConsoleConfig) -> String {
    match target {
        Redirect::Login => config.login_path().to_string(),
        Redirect::Home => config.home_path().to_string(),
        Redirect::Path(path) => path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_uses_configured_paths() {
        let config = ConsoleConfig::new()
            .with_login_path("/acceso".to_string())
            .with_home_path("/panel".to_string());
        assert_eq!(location(&Redirect::Login, &config), "/acceso");
        assert_eq!(location(&Redirect::Home, &config), "/panel");
        assert_eq!(
            location(&Redirect::Path("/admin/users".to_string()), &config),
            "/admin/users"
        );
    }
}
