//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use keystone_api::DEFAULT_PROFILE_LENGTH;
use keystone_config::AppConfig;
use keystone_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::{debug, warn};

use crate::commands::{database, profile, routes, shell, superuser, test};
use crate::context::CommandContext;
use crate::error::CliResult;
use crate::prompt::TerminalPrompter;

/// Parses arguments, runs the requested command, and returns the process
/// exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<i32> {
    let config = AppConfig::from_env()?;
    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::from_name(config.log_format.as_deref()),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }
    debug!(command = cli.command.label(), profile = %config.profile, "dispatching");

    let ctx = CommandContext::new(config);
    let result = dispatch(cli.command, &ctx).await;
    ctx.close().await;
    if let Err(err) = &result {
        warn!(exit_code = err.exit_code(), "command failed");
    }
    result
}

async fn dispatch(command: Command, ctx: &CommandContext) -> CliResult<i32> {
    match command {
        Command::CreateDb => database::handle_create_db(ctx).await.map(|()| 0),
        Command::DropDb => database::handle_drop_db(ctx).await.map(|()| 0),
        Command::Shell => shell::handle_shell(ctx).await.map(|()| 0),
        Command::Test(args) => test::handle_test(ctx, args.coverage),
        Command::Routes => routes::handle_routes().map(|()| 0),
        Command::DbUpgrade => database::handle_db_upgrade(ctx).await.map(|()| 0),
        Command::Createsuperuser(args) => {
            let input = superuser::SuperuserInput::resolve(
                args.email,
                args.username,
                args.password,
                &mut TerminalPrompter,
            )?;
            superuser::handle_createsuperuser(ctx, input)
                .await
                .map(|()| 0)
        }
        Command::Profile(args) => profile::handle_profile(ctx, args.length, args.profile_dir)
            .await
            .map(|()| 0),
    }
}

#[derive(Parser)]
#[command(
    name = "keystone-manage",
    about = "Administrative commands for the Keystone application"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create the database tables.
    #[command(name = "create_db")]
    CreateDb,
    /// Drop the database tables.
    #[command(name = "drop_db")]
    DropDb,
    /// Start an interactive shell with the application context loaded.
    #[command(name = "shell")]
    Shell,
    /// Run the unit tests.
    #[command(name = "test")]
    Test(TestArgs),
    /// Display all routes defined in the application.
    #[command(name = "routes")]
    Routes,
    /// Upgrade the database to the latest migration.
    #[command(name = "db_upgrade")]
    DbUpgrade,
    /// Create an administrative account.
    #[command(name = "createsuperuser")]
    Createsuperuser(SuperuserArgs),
    /// Start the application under the request profiler.
    #[command(name = "profile")]
    Profile(ProfileArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::CreateDb => "create_db",
            Self::DropDb => "drop_db",
            Self::Shell => "shell",
            Self::Test(_) => "test",
            Self::Routes => "routes",
            Self::DbUpgrade => "db_upgrade",
            Self::Createsuperuser(_) => "createsuperuser",
            Self::Profile(_) => "profile",
        }
    }
}

#[derive(Args)]
pub(crate) struct TestArgs {
    /// Enable code coverage.
    #[arg(long)]
    pub(crate) coverage: bool,
}

#[derive(Args)]
pub(crate) struct SuperuserArgs {
    /// Email address.
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Username.
    #[arg(long)]
    pub(crate) username: Option<String>,
    /// Password (prompted with confirmation when omitted).
    #[arg(long)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct ProfileArgs {
    /// Number of entries to include in the profiler report.
    #[arg(long, default_value_t = DEFAULT_PROFILE_LENGTH)]
    pub(crate) length: usize,
    /// Directory where profiler data files are saved.
    #[arg(long)]
    pub(crate) profile_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn long_options(name: &str) -> Vec<String> {
        let command = Cli::command();
        let sub = command
            .find_subcommand(name)
            .unwrap_or_else(|| panic!("subcommand {name} missing"));
        let mut longs: Vec<String> = sub
            .get_arguments()
            .filter_map(|arg| arg.get_long().map(str::to_string))
            .filter(|long| long != "help")
            .collect();
        longs.sort();
        longs
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_use_documented_names() {
        let command = Cli::command();
        let names: Vec<_> = command
            .get_subcommands()
            .map(|sub| sub.get_name().to_string())
            .filter(|name| name != "help")
            .collect();
        assert_eq!(
            names,
            [
                "create_db",
                "drop_db",
                "shell",
                "test",
                "routes",
                "db_upgrade",
                "createsuperuser",
                "profile"
            ]
        );
    }

    #[test]
    fn each_command_exposes_only_documented_options() {
        for name in ["create_db", "drop_db", "shell", "routes", "db_upgrade"] {
            assert!(long_options(name).is_empty(), "{name} should take no options");
        }
        assert_eq!(long_options("test"), ["coverage"]);
        assert_eq!(
            long_options("createsuperuser"),
            ["email", "password", "username"]
        );
        assert_eq!(long_options("profile"), ["length", "profile-dir"]);
    }

    #[test]
    fn profile_length_defaults_to_twenty_five() {
        let cli = Cli::try_parse_from(["keystone-manage", "profile"]).expect("parse");
        match cli.command {
            Command::Profile(args) => {
                assert_eq!(args.length, 25);
                assert!(args.profile_dir.is_none());
            }
            _ => panic!("expected profile"),
        }
    }

    #[test]
    fn invalid_length_is_rejected() {
        let err = Cli::try_parse_from(["keystone-manage", "profile", "--length", "many"])
            .err()
            .expect("parse should fail");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn help_is_a_display_request() {
        let err = Cli::try_parse_from(["keystone-manage", "createsuperuser", "--help"])
            .err()
            .expect("help short-circuits parsing");
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
