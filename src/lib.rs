//! # posconsole (Point of sale administrative console)
//!
//! `posconsole` is the session and access core of a small retail back office.
//! It authenticates staff against a credential store, keeps a server-side
//! session per browser and gates every administrative route on the role held
//! by the session.
//!
//! ## Sessions
//!
//! - **Snapshot:** a login copies the user record into the session once; later
//!   requests trust the snapshot and never re-read the credential store.
//! - **Idle timeout:** a session idle for more than one hour is destroyed on its
//!   next request and the client is sent back to the login page with a flash
//!   message explaining why.
//! - **Fixation:** the session identifier is rotated on every successful login.
//!
//! ## Roles
//!
//! Users hold exactly one of `administrator`, `salesperson` or `warehouse`.
//! An administrator satisfies every role check.

pub mod cli;
pub mod console;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }
}
