pub mod logging;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

use crate::console::role::Role;

pub const CMD_SERVER: &str = "server";
pub const CMD_USERADD: &str = "useradd";

fn dsn_arg() -> Arg {
    Arg::new("dsn")
        .short('d')
        .long("dsn")
        .help("Database connection string")
        .env("POSCONSOLE_DSN")
        .required(true)
}

fn server_command() -> Command {
    Command::new(CMD_SERVER)
        .about("Serve the console")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("POSCONSOLE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(dsn_arg())
        .arg(
            Arg::new("session-store")
                .long("session-store")
                .help("Where session state is kept")
                .default_value("postgres")
                .env("POSCONSOLE_SESSION_STORE")
                .value_parser(PossibleValuesParser::new(["postgres", "memory"])),
        )
        .arg(
            Arg::new("idle-timeout")
                .long("idle-timeout")
                .help("Seconds of inactivity before a session expires")
                .default_value("3600")
                .env("POSCONSOLE_IDLE_TIMEOUT")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new("cookie-secure")
                .long("cookie-secure")
                .help("Mark the session cookie Secure (HTTPS only)")
                .env("POSCONSOLE_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
}

fn useradd_command() -> Command {
    Command::new(CMD_USERADD)
        .about("Create a console user")
        .arg(dsn_arg())
        .arg(
            Arg::new("username")
                .long("username")
                .help("Login name (case-sensitive)")
                .required(true),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Display name")
                .required(true),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .help("Email address")
                .required(true),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .help("Role granted to the user")
                .default_value(Role::Administrator.as_str())
                .value_parser(PossibleValuesParser::new(Role::ALL.map(Role::as_str))),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Initial password")
                .env("POSCONSOLE_USER_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("posconsole")
        .about("Point of sale administrative console")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(server_command())
        .subcommand(useradd_command());

    logging::with_args(command)
}
