use crate::{
    cli::actions::server::redacted_dsn,
    console::{
        credentials::{CredentialStore, PgCredentialStore, UserRecord, WriteOutcome},
        db,
        password::hash_password,
        validation::{validate_new_user, UserDraft, Validation},
    },
};
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub password: SecretString,
}

impl Args {
    fn draft(&self) -> UserDraft {
        UserDraft {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            active: true,
        }
    }
}

/// Validate, hash and insert one user.
/// # Errors
/// Returns an error listing every validation problem, or a storage error
pub async fn create_user(store: &dyn CredentialStore, args: &Args) -> Result<UserRecord> {
    let password = args.password.expose_secret();
    let profile = match validate_new_user(store, &args.draft(), password).await? {
        Validation::Valid(profile) => profile,
        Validation::Invalid(errors) => return Err(anyhow!(errors.join("; "))),
    };

    match store.create(&profile, &hash_password(password)?).await? {
        WriteOutcome::Saved(user) => Ok(user),
        WriteOutcome::Conflict => Err(anyhow!("Username or email is already in use")),
        WriteOutcome::NotFound => Err(anyhow!("user vanished while being created")),
    }
}

/// Handle the useradd action
/// # Errors
/// Returns an error if the database is unreachable or the user is rejected
pub async fn handle(args: Args) -> Result<()> {
    info!(dsn = %redacted_dsn(&args.dsn), "connecting to database");

    let pool = db::connect(&args.dsn).await?;
    db::apply_schema(&pool).await?;

    let store = PgCredentialStore::new(pool);
    let user = create_user(&store, &args).await?;

    info!(user_id = user.id, username = %user.username, role = %user.role, "user created");
    println!("created {} ({}) with id {}", user.username, user.role, user.id);

    Ok(())
}
