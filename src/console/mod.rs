use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod authenticator;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod guard;
pub mod handlers;
mod openapi;
pub mod password;
pub mod role;
pub mod session;
#[cfg(test)]
pub(crate) mod test_db;
pub mod validation;

pub use openapi::openapi;

use authenticator::Authenticator;
use config::ConsoleConfig;
use credentials::CredentialStore;
use session::{SessionManager, SessionStore};

/// Shared application state.
pub struct ConsoleState {
    sessions: SessionManager,
    authenticator: Authenticator,
    users: Arc<dyn CredentialStore>,
}

impl ConsoleState {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
        config: ConsoleConfig,
    ) -> Self {
        Self {
            sessions: SessionManager::new(session_store, config),
            authenticator: Authenticator::new(users.clone()),
            users,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        self.sessions.config()
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    #[must_use]
    pub fn users(&self) -> &dyn CredentialStore {
        self.users.as_ref()
    }
}

/// Console routes with the session layer applied.
pub fn router(state: Arc<ConsoleState>) -> Router {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/session", get(handlers::current_session))
        .route("/admin", get(handlers::dashboard))
        .route(
            "/admin/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/admin/users/:id",
            get(handlers::users::show).post(handlers::users::update),
        )
        .route(
            "/admin/users/:id/password",
            post(handlers::users::change_password),
        )
        .route(
            "/admin/users/:id/deactivate",
            post(handlers::users::deactivate),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::layer::session_layer,
        ))
        .route("/health", get(handlers::health).options(handlers::health))
        .route("/openapi.json", get(handlers::openapi_json))
        .layer(Extension(state))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, pool: PgPool, state: Arc<ConsoleState>) -> Result<()> {
    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
