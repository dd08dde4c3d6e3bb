//! Input rules for creating and editing console users.

use anyhow::Result;
use regex::Regex;

use super::{
    credentials::{CredentialStore, UserProfile},
    password::password_problems,
    role::Role,
};

const MIN_USERNAME_LEN: usize = 3;

/// Raw user fields as submitted.
#[derive(Clone, Debug, Default)]
pub struct UserDraft {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
}

#[derive(Debug)]
pub enum Validation {
    Valid(UserProfile),
    Invalid(Vec<String>),
}

/// Lightweight email sanity check.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Emails are compared and stored trimmed and lowercase.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a draft against the field rules and the store's uniqueness
/// constraints. `excluding` is the id of the user being edited, if any.
///
/// # Errors
/// Return error if the store cannot be queried
pub async fn validate(
    store: &dyn CredentialStore,
    draft: &UserDraft,
    excluding: Option<i64>,
) -> Result<Validation> {
    let mut errors = Vec::new();

    let username = draft.username.trim();
    if username.is_empty() {
        errors.push("Username is required".to_string());
    } else if username.chars().count() < MIN_USERNAME_LEN {
        errors.push(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters long"
        ));
    } else if store.username_exists(username, excluding).await? {
        errors.push("Username is already taken".to_string());
    }

    let display_name = draft.display_name.trim();
    if display_name.is_empty() {
        errors.push("Name is required".to_string());
    }

    let email = normalize_email(&draft.email);
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !valid_email(&email) {
        errors.push("Email is not valid".to_string());
    } else if store.email_exists(&email, excluding).await? {
        errors.push("Email is already registered".to_string());
    }

    let role = draft.role.trim().parse::<Role>();
    if role.is_err() {
        errors.push("Role is not valid".to_string());
    }

    match role {
        Ok(role) if errors.is_empty() => Ok(Validation::Valid(UserProfile {
            username: username.to_string(),
            display_name: display_name.to_string(),
            email,
            role,
            active: draft.active,
        })),
        _ => Ok(Validation::Invalid(errors)),
    }
}

/// [`validate`] for a new user, plus the password strength rules.
///
/// # Errors
/// Return error if the store cannot be queried
pub async fn validate_new_user(
    store: &dyn CredentialStore,
    draft: &UserDraft,
    password: &str,
) -> Result<Validation> {
    let problems = password_problems(password);
    match validate(store, draft, None).await? {
        Validation::Valid(profile) if problems.is_empty() => Ok(Validation::Valid(profile)),
        Validation::Valid(_) => Ok(Validation::Invalid(problems)),
        Validation::Invalid(mut errors) => {
            errors.extend(problems);
            Ok(Validation::Invalid(errors))
        }
    }
}
