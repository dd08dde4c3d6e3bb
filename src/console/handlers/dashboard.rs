use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::console::{
    error::AuthError,
    guard::Principal,
    session::{Flash, SessionHandle},
    ConsoleState,
};

#[derive(Serialize, ToSchema, Debug)]
pub struct Dashboard {
    user: Principal,
    flash: Option<Flash>,
    csrf_token: String,
}

#[utoipa::path(
    get,
    path= "/admin",
    responses (
        (status = 200, description = "Dashboard for any authenticated user", body = [Dashboard]),
        (status = 303, description = "No session or session expired, redirect to login")
    ),
    tag= "console"
)]
pub async fn dashboard(
    Extension(state): Extension<Arc<ConsoleState>>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, AuthError> {
    let mut session = handle.lock().await;
    let sessions = state.sessions();

    let user = sessions.require_login(&mut session).await?;
    let flash = sessions.take_flash(&mut session).await?;
    let csrf_token = sessions.generate_token(&mut session).await?;

    Ok(Json(Dashboard {
        user,
        flash,
        csrf_token,
    })
    .into_response())
}
