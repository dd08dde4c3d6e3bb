use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
    Form,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::console::{
    error::{AuthError, Redirect},
    session::{Flash, SessionHandle, Severity},
    ConsoleState,
};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct LoginPage {
    flash: Option<Flash>,
}

#[utoipa::path(
    get,
    path= "/login",
    responses (
        (status = 200, description = "Login page data with the pending flash message", body = [LoginPage]),
        (status = 303, description = "Already logged in, redirect to the home page")
    ),
    tag= "auth"
)]
pub async fn login_page(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    if session.is_logged_in() {
        return Ok(Redirect::Home.into_response());
    }

    let flash = state.sessions().take_flash(&mut session).await?;

    Ok(Json(LoginPage { flash }).into_response())
}

#[utoipa::path(
    post,
    path= "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "Home page on success, login page with a flash message otherwise")
    ),
    tag= "auth"
)]
pub async fn login(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();

    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        sessions
            .set_flash(&mut session, MISSING_FIELDS_MESSAGE, Severity::Error)
            .await?;
        return Ok(Redirect::Login.into_response());
    }

    let password = SecretString::from(form.password);
    match state.authenticator().login(username, &password).await {
        Ok(user) => {
            sessions.create_session(&mut session, &user).await?;
            Ok(Redirect::Home.into_response())
        }
        Err(AuthError::AuthenticationFailure) => {
            sessions
                .set_flash(&mut session, INVALID_CREDENTIALS_MESSAGE, Severity::Error)
                .await?;
            Ok(Redirect::Login.into_response())
        }
        Err(err) => Err(err),
    }
}
