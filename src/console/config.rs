//! Console configuration: session timeout, cookie attributes and redirect targets.

const DEFAULT_IDLE_TIMEOUT_SECONDS: i64 = 60 * 60;
const DEFAULT_COOKIE_NAME: &str = "posconsole_session";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_HOME_PATH: &str = "/admin";

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    idle_timeout_seconds: i64,
    cookie_name: String,
    cookie_secure: bool,
    login_path: String,
    home_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            idle_timeout_seconds: DEFAULT_IDLE_TIMEOUT_SECONDS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_idle_timeout_seconds(mut self, seconds: i64) -> Self {
        self.idle_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    #[must_use]
    pub fn with_home_path(mut self, path: String) -> Self {
        self.home_path = path;
        self
    }

    /// Seconds of inactivity after which a session is forced back to anonymous.
    /// Also used as the session cookie `Max-Age`.
    #[must_use]
    pub fn idle_timeout_seconds(&self) -> i64 {
        self.idle_timeout_seconds
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    /// Redirect target when a session is required.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Redirect target after login and when a role check fails.
    #[must_use]
    pub fn home_path(&self) -> &str {
        &self.home_path
    }
}
