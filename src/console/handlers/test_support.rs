//! Router harness over the in-memory stores.

use anyhow::{anyhow, bail, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request,
    },
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use crate::console::{
    config::ConsoleConfig,
    credentials::{CredentialStore, MemoryCredentialStore, UserProfile},
    password::hash_password,
    role::Role,
    router,
    session::{now_unix, MemorySessionStore, SessionStore},
    ConsoleState,
};

pub(crate) struct TestApp {
    pub(crate) state: Arc<ConsoleState>,
    sessions: Arc<MemorySessionStore>,
    router: Router,
}

impl TestApp {
    /// alice: active administrator, bob: inactive warehouse, carol: active
    /// warehouse. Every password is `Secret123`.
    pub(crate) async fn new() -> Result<Self> {
        let users = Arc::new(MemoryCredentialStore::new());
        let seed = [
            ("alice", Role::Administrator, true),
            ("bob", Role::Warehouse, false),
            ("carol", Role::Warehouse, true),
        ];
        for (username, role, active) in seed {
            let profile = UserProfile {
                username: username.to_string(),
                display_name: username.to_string(),
                email: format!("{username}@example.com"),
                role,
                active,
            };
            users.create(&profile, &hash_password("Secret123")?).await?;
        }

        let sessions = Arc::new(MemorySessionStore::new());
        let state = Arc::new(ConsoleState::new(
            users,
            sessions.clone(),
            ConsoleConfig::new(),
        ));

        Ok(Self {
            router: router(state.clone()),
            state,
            sessions,
        })
    }

    pub(crate) async fn send(&self, request: Request<Body>) -> Result<Response> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    /// Log in through the router and return the session cookie pair.
    pub(crate) async fn login(&self, username: &str, password: &str) -> Result<String> {
        let body = format!("username={username}&password={password}");
        let response = self.send(post_form("/login", None, &body)?).await?;
        if location(&response) != Some("/admin") {
            bail!("login failed for {username}");
        }
        cookie_from(&response).ok_or_else(|| anyhow!("no session cookie issued"))
    }

    pub(crate) async fn csrf_token(&self, cookie: &str) -> Result<String> {
        let json = body_json(self.send(get("/admin", Some(cookie))?).await?).await?;
        json["csrf_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("dashboard carried no token"))
    }

    pub(crate) async fn user_id(&self, username: &str) -> Result<i64> {
        self.state
            .users()
            .list()
            .await?
            .into_iter()
            .find(|user| user.username == username)
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("no user {username}"))
    }

    /// Pretend the session behind `cookie` saw no activity for `seconds`.
    pub(crate) async fn idle(&self, cookie: &str, seconds: i64) -> Result<()> {
        let id = cookie
            .split_once('=')
            .map(|(_, id)| id)
            .ok_or_else(|| anyhow!("malformed cookie"))?;
        let mut state = self
            .sessions
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("unknown session"))?;
        if let Some(user) = state.user.as_mut() {
            user.last_activity = now_unix() - seconds;
        }
        self.sessions.set(id, &state).await
    }
}

pub(crate) fn get(path: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::get(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

pub(crate) fn post_form(path: &str, cookie: Option<&str>, body: &str) -> Result<Request<Body>> {
    let mut builder = Request::post(path).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

pub(crate) fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub(crate) fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// The `name=value` pair of the last cookie that carries a session id.
pub(crate) fn cookie_from(response: &Response) -> Option<String> {
    set_cookies(response)
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .filter(|pair| pair.split_once('=').is_some_and(|(_, value)| !value.is_empty()))
        .last()
        .map(str::to_string)
}

pub(crate) async fn body_json(response: Response) -> Result<serde_json::Value> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}
