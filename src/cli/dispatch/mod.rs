//! Map validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{server, useradd, Action},
    commands::{CMD_SERVER, CMD_USERADD},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn required<'a>(matches: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing required argument: --{name}"))
}

/// # Errors
/// Returns an error if the subcommand or one of its required arguments is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_SERVER, sub_m)) => Ok(Action::Server(server::Args {
            port: sub_m.get_one::<u16>("port").copied().unwrap_or(8080),
            dsn: required(sub_m, "dsn")?.clone(),
            session_store: required(sub_m, "session-store")?.parse()?,
            idle_timeout: sub_m.get_one::<i64>("idle-timeout").copied().unwrap_or(3600),
            cookie_secure: sub_m.get_flag("cookie-secure"),
        })),
        Some((CMD_USERADD, sub_m)) => Ok(Action::UserAdd(useradd::Args {
            dsn: required(sub_m, "dsn")?.clone(),
            username: required(sub_m, "username")?.clone(),
            display_name: required(sub_m, "name")?.clone(),
            email: required(sub_m, "email")?.clone(),
            role: required(sub_m, "role")?.clone(),
            password: SecretString::from(required(sub_m, "password")?.clone()),
        })),
        _ => Err(anyhow!("unknown subcommand")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::server::SessionBackend;
    use secrecy::ExposeSecret;

    #[test]
    fn test_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("POSCONSOLE_SESSION_STORE", None::<&str>),
                ("POSCONSOLE_IDLE_TIMEOUT", Some("120")),
                ("POSCONSOLE_COOKIE_SECURE", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec![
                    "posconsole",
                    "server",
                    "--dsn",
                    "postgres://pos@localhost:5432/pos",
                    "--session-store",
                    "memory",
                ]);
                let Action::Server(args) = handler(&matches)? else {
                    return Err(anyhow!("expected server action"));
                };
                assert_eq!(args.port, 8080);
                assert_eq!(args.session_store, SessionBackend::Memory);
                assert_eq!(args.idle_timeout, 120);
                assert!(!args.cookie_secure);
                Ok(())
            },
        )
    }

    #[test]
    fn test_useradd_action() -> Result<()> {
        temp_env::with_vars([("POSCONSOLE_USER_PASSWORD", None::<&str>)], || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "posconsole",
                "useradd",
                "--dsn",
                "postgres://pos@localhost:5432/pos",
                "--username",
                "carol",
                "--name",
                "Carol",
                "--email",
                "carol@example.com",
                "--role",
                "warehouse",
                "--password",
                "Secret123",
            ]);
            let Action::UserAdd(args) = handler(&matches)? else {
                return Err(anyhow!("expected useradd action"));
            };
            assert_eq!(args.username, "carol");
            assert_eq!(args.display_name, "Carol");
            assert_eq!(args.role, "warehouse");
            assert_eq!(args.password.expose_secret(), "Secret123");
            Ok(())
        })
    }
}
