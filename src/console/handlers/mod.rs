pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::{login, login_page};

pub mod logout;
pub use self::logout::logout;

pub mod session;
pub use self::session::current_session;

pub mod dashboard;
pub use self::dashboard::dashboard;

pub mod users;

use axum::{response::IntoResponse, Json};

// served as-is; the document is built from the handler annotations
pub async fn openapi_json() -> impl IntoResponse {
    Json(super::openapi())
}

#[cfg(test)]
pub(crate) mod test_support;
