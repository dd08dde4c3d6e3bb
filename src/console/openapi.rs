#![allow(clippy::needless_for_each)]

use utoipa::OpenApi;

use super::{
    credentials::UserRecord,
    guard::Principal,
    handlers::{dashboard, health, login, logout, session, users},
    role::Role,
    session::{Flash, Severity},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login_page,
        login::login,
        logout::logout,
        session::current_session,
        dashboard::dashboard,
        users::list,
        users::show,
        users::create,
        users::update,
        users::change_password,
        users::deactivate,
    ),
    components(
        schemas(
            health::Health,
            login::LoginForm,
            login::LoginPage,
            session::SessionInfo,
            dashboard::Dashboard,
            users::UserList,
            users::UserDetail,
            users::UserForm,
            users::PasswordForm,
            users::TokenForm,
            users::ValidationErrors,
            UserRecord,
            Principal,
            Role,
            Flash,
            Severity,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout and session"),
        (name = "console", description = "Authenticated console pages"),
        (name = "users", description = "User administration"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_console_routes() {
        let doc = openapi();
        for path in [
            "/health",
            "/login",
            "/logout",
            "/session",
            "/admin",
            "/admin/users",
            "/admin/users/{id}",
            "/admin/users/{id}/password",
            "/admin/users/{id}/deactivate",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
