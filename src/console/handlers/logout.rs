use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::console::{
    error::{AuthError, Redirect},
    session::{SessionHandle, Severity},
    ConsoleState,
};

pub const LOGOUT_MESSAGE: &str = "Session closed successfully";

#[utoipa::path(
    post,
    path= "/logout",
    responses (
        (status = 303, description = "Session destroyed, redirect to the login page")
    ),
    tag= "auth"
)]
pub async fn logout(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();

    sessions.destroy_session(&mut session).await?;
    // lands on a fresh anonymous session
    sessions
        .set_flash(&mut session, LOGOUT_MESSAGE, Severity::Success)
        .await?;

    Ok(Redirect::Login.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::handlers::test_support::{
        body_json, cookie_from, get, location, post_form, set_cookies, TestApp,
    };
    use anyhow::Result;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn logout_expires_old_cookie_and_leaves_success_flash() -> Result<()> {
        let app = TestApp::new().await?;
        let cookie = app.login("alice", "Secret123").await?;

        let response = app.send(post_form("/logout", Some(&cookie), "")?).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].contains("Max-Age=0"));
        let fresh = cookie_from(&response);
        assert!(fresh.is_some());
        assert_ne!(fresh.as_deref(), Some(cookie.as_str()));

        let page = app.send(get("/login", fresh.as_deref())?).await?;
        let json = body_json(page).await?;
        assert_eq!(json["flash"]["message"], LOGOUT_MESSAGE);
        assert_eq!(json["flash"]["severity"], "success");

        let response = app.send(get("/admin", Some(&cookie))?).await?;
        assert_eq!(location(&response), Some("/login"));
        Ok(())
    }

    #[tokio::test]
    async fn logout_via_get_is_accepted() -> Result<()> {
        let app = TestApp::new().await?;
        let cookie = app.login("alice", "Secret123").await?;

        let response = app.send(get("/logout", Some(&cookie))?).await?;
        assert_eq!(location(&response), Some("/login"));
        Ok(())
    }
}
