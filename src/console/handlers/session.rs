use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::console::{error::AuthError, role::Role, session::SessionHandle, ConsoleState};

/// Public view of the session snapshot.
#[derive(Serialize, ToSchema, Debug)]
pub struct SessionInfo {
    user_id: i64,
    username: String,
    display_name: String,
    email: String,
    role: Role,
    login_time: i64,
    last_activity: i64,
}

#[utoipa::path(
    get,
    path= "/session",
    responses (
        (status = 200, description = "Authenticated session snapshot", body = [SessionInfo]),
        (status = 204, description = "Anonymous or expired session")
    ),
    tag= "auth"
)]
pub async fn current_session(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;

    match state.sessions().require_login(&mut session).await {
        Ok(_) => {}
        Err(AuthError::SessionRequired { .. }) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => return Err(err),
    }

    let Some(user) = session.user() else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Ok(Json(SessionInfo {
        user_id: user.user_id,
        username: user.username.clone(),
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        role: user.role,
        login_time: user.login_time,
        last_activity: user.last_activity,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use crate::console::handlers::test_support::{body_json, get, TestApp};
    use anyhow::Result;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn anonymous_session_has_no_content() -> Result<()> {
        let app = TestApp::new().await?;
        let response = app.send(get("/session", None)?).await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get("set-cookie").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_carries_no_secrets() -> Result<()> {
        let app = TestApp::new().await?;
        let cookie = app.login("alice", "Secret123").await?;

        let response = app.send(get("/session", Some(&cookie))?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await?;
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "administrator");
        assert!(json.get("csrf_token").is_none());
        assert!(json.get("password_hash").is_none());
        Ok(())
    }
}
