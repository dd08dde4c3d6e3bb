//! Administrator-only user management.
//!
//! Every handler passes the role gate first; state-changing handlers then
//! check the anti-forgery token before touching the credential store. Path and
//! form extraction failures are held back until the gate has passed, so an
//! anonymous caller is redirected no matter what it sends.

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::console::{
    credentials::{UserRecord, WriteOutcome},
    error::{AuthError, Redirect},
    password::{hash_password, password_problems},
    role::Role,
    session::{Flash, Session, SessionHandle, Severity},
    validation::{validate, validate_new_user, UserDraft, Validation},
    ConsoleState,
};

const USERS_PATH: &str = "/admin/users";
const CONFLICT_MESSAGE: &str = "Username or email is already in use";
pub const SELF_DEACTIVATION_MESSAGE: &str = "You cannot deactivate your own account";
pub const SELF_DEMOTION_MESSAGE: &str = "You cannot remove your own administrator role";

#[derive(Serialize, ToSchema, Debug)]
pub struct UserList {
    users: Vec<UserRecord>,
    flash: Option<Flash>,
    csrf_token: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct UserDetail {
    user: UserRecord,
    csrf_token: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ValidationErrors {
    errors: Vec<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
pub struct UserForm {
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default = "default_active")]
    active: bool,
    /// Only read on create.
    #[serde(default)]
    password: String,
}

impl UserForm {
    fn draft(&self) -> UserDraft {
        UserDraft {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            active: self.active,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordForm {
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TokenForm {
    #[serde(default)]
    csrf_token: String,
}

fn invalid(errors: Vec<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidationErrors { errors }),
    )
        .into_response()
}

fn rejected(rejection: impl IntoResponse) -> Result<Response, AuthError> {
    Ok(rejection.into_response())
}

async fn refuse(
    state: &ConsoleState,
    session: &mut Session,
    message: &str,
) -> Result<Response, AuthError> {
    state
        .sessions()
        .set_flash(session, message, Severity::Error)
        .await?;
    Ok(Redirect::Path(USERS_PATH.to_string()).into_response())
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "user not found" })),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path= "/admin/users",
    responses (
        (status = 200, description = "All users, newest first", body = [UserList]),
        (status = 303, description = "Not logged in or not an administrator")
    ),
    tag= "users"
)]
pub async fn list(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    sessions
        .require_role(&mut session, Role::Administrator)
        .await?;

    let users = state.users().list().await?;
    let flash = sessions.take_flash(&mut session).await?;
    let csrf_token = sessions.generate_token(&mut session).await?;

    Ok(Json(UserList {
        users,
        flash,
        csrf_token,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path= "/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses (
        (status = 200, description = "User found", body = [UserDetail]),
        (status = 303, description = "Not logged in or not an administrator"),
        (status = 404, description = "No user with this id")
    ),
    tag= "users"
)]
pub async fn show(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    sessions
        .require_role(&mut session, Role::Administrator)
        .await?;
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection),
    };

    let Some(user) = state.users().find_by_id(id).await? else {
        return Ok(not_found());
    };
    let csrf_token = sessions.generate_token(&mut session).await?;

    Ok(Json(UserDetail { user, csrf_token }).into_response())
}

#[utoipa::path(
    post,
    path= "/admin/users",
    request_body(content = UserForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "User created, or the request was rejected by the guard"),
        (status = 422, description = "Validation failed", body = [ValidationErrors])
    ),
    tag= "users"
)]
pub async fn create(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    form: Result<Form<UserForm>, FormRejection>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    let admin = sessions
        .require_role(&mut session, Role::Administrator)
        .await?;
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return rejected(rejection),
    };
    sessions.require_token(&mut session, &form.csrf_token).await?;

    let profile =
        match validate_new_user(state.users(), &form.draft(), &form.password).await? {
            Validation::Valid(profile) => profile,
            Validation::Invalid(errors) => return Ok(invalid(errors)),
        };

    let hash = hash_password(&form.password)?;
    let user = match state.users().create(&profile, &hash).await? {
        WriteOutcome::Saved(user) => user,
        WriteOutcome::Conflict => return Ok(invalid(vec![CONFLICT_MESSAGE.to_string()])),
        WriteOutcome::NotFound => return Ok(not_found()),
    };

    info!(
        admin_id = admin.user_id,
        user_id = user.id,
        username = %user.username,
        "user created"
    );
    sessions
        .set_flash(&mut session, "User created successfully", Severity::Success)
        .await?;

    Ok(Redirect::Path(USERS_PATH.to_string()).into_response())
}

#[utoipa::path(
    post,
    path= "/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body(content = UserForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "User updated, or the request was rejected by the guard"),
        (status = 404, description = "No user with this id"),
        (status = 422, description = "Validation failed", body = [ValidationErrors])
    ),
    tag= "users"
)]
pub async fn update(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    path: Result<Path<i64>, PathRejection>,
    form: Result<Form<UserForm>, FormRejection>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    let admin = sessions
        .require_role(&mut session, Role::Administrator)
        .await?;
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return rejected(rejection),
    };
    sessions.require_token(&mut session, &form.csrf_token).await?;

    if state.users().find_by_id(id).await?.is_none() {
        return Ok(not_found());
    }

    let profile = match validate(state.users(), &form.draft(), Some(id)).await? {
        Validation::Valid(profile) => profile,
        Validation::Invalid(errors) => return Ok(invalid(errors)),
    };

    // the acting administrator must stay an active administrator
    if admin.user_id == id {
        if !profile.active {
            return refuse(&state, &mut session, SELF_DEACTIVATION_MESSAGE).await;
        }
        if profile.role != Role::Administrator {
            return refuse(&state, &mut session, SELF_DEMOTION_MESSAGE).await;
        }
    }

    match state.users().update(id, &profile).await? {
        WriteOutcome::Saved(user) => {
            info!(admin_id = admin.user_id, user_id = user.id, "user updated");
        }
        WriteOutcome::Conflict => return Ok(invalid(vec![CONFLICT_MESSAGE.to_string()])),
        WriteOutcome::NotFound => return Ok(not_found()),
    }

    sessions
        .set_flash(&mut session, "User updated successfully", Severity::Success)
        .await?;

    Ok(Redirect::Path(USERS_PATH.to_string()).into_response())
}

#[utoipa::path(
    post,
    path= "/admin/users/{id}/password",
    params(("id" = i64, Path, description = "User id")),
    request_body(content = PasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "Password changed, or the request was rejected by the guard"),
        (status = 404, description = "No user with this id"),
        (status = 422, description = "Password too weak", body = [ValidationErrors])
    ),
    tag= "users"
)]
pub async fn change_password(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    path: Result<Path<i64>, PathRejection>,
    form: Result<Form<PasswordForm>, FormRejection>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    let admin = sessions
        .require_role(&mut session, Role::Administrator)
        .await?;
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return rejected(rejection),
    };
    sessions.require_token(&mut session, &form.csrf_token).await?;

    let problems = password_problems(&form.password);
    if !problems.is_empty() {
        return Ok(invalid(problems));
    }

    let hash = hash_password(&form.password)?;
    if !state.users().change_password(id, &hash).await? {
        return Ok(not_found());
    }

    info!(admin_id = admin.user_id, user_id = id, "password changed");
    sessions
        .set_flash(&mut session, "Password changed successfully", Severity::Success)
        .await?;

    Ok(Redirect::Path(USERS_PATH.to_string()).into_response())
}

#[utoipa::path(
    post,
    path= "/admin/users/{id}/deactivate",
    params(("id" = i64, Path, description = "User id")),
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    responses (
        (status = 303, description = "User deactivated, refused, or rejected by the guard"),
        (status = 404, description = "No user with this id")
    ),
    tag= "users"
)]
pub async fn deactivate(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
    path: Result<Path<i64>, PathRejection>,
    form: Result<Form<TokenForm>, FormRejection>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();
    let admin = sessions
        .require_role(&mut session, Role::Administrator)
        .await?;
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return rejected(rejection),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return rejected(rejection),
    };
    sessions.require_token(&mut session, &form.csrf_token).await?;

    if admin.user_id == id {
        return refuse(&state, &mut session, SELF_DEACTIVATION_MESSAGE).await;
    }

    if !state.users().deactivate(id).await? {
        return Ok(not_found());
    }

    info!(admin_id = admin.user_id, user_id = id, "user deactivated");
    sessions
        .set_flash(&mut session, "User deactivated successfully", Severity::Success)
        .await?;

    Ok(Redirect::Path(USERS_PATH.to_string()).into_response())
}
