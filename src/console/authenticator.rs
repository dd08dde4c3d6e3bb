//! Username/password verification against the credential store.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    credentials::{CredentialStore, UserRecord},
    error::AuthError,
    password::{verify_decoy, verify_password},
};

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Verify credentials and return the sanitized user record.
    ///
    /// Unknown users, inactive users and wrong passwords all produce the same
    /// [`AuthError::AuthenticationFailure`]. No session is touched here.
    ///
    /// # Errors
    /// [`AuthError::Storage`] when the credential store is unreachable.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<UserRecord, AuthError> {
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::AuthenticationFailure);
        }

        let Some(credential) = self.store.find_active_by_username(username).await? else {
            verify_decoy(password.expose_secret());
            info!("login failed");
            return Err(AuthError::AuthenticationFailure);
        };

        if !verify_password(password.expose_secret(), credential.password_hash()) {
            info!("login failed");
            return Err(AuthError::AuthenticationFailure);
        }

        Ok(credential.into_user())
    }
}
