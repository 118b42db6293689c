//! Interactive administration shell.
//!
//! Lines starting with a backslash are meta commands; anything else is sent
//! to the database as one SQL statement. Statement errors are printed and the
//! session continues.

use std::io::{self, Write};

use keystone_api::{RouteEntry, route_table};
use keystone_config::AppConfig;
use keystone_data::{Database, StatementOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::routes::render_routes;
use crate::context::CommandContext;
use crate::error::{CliError, CliResult, io_failure};

const PROMPT: &str = "keystone> ";

const HELP: &str = "\
\\routes   list registered routes
\\config   show the active configuration
\\roles    list roles
\\users    list users
\\help     show this message
\\q        quit (also `exit`, `quit`, or end of input)
Anything else runs as a single SQL statement.
";

/// Meta commands understood by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetaCommand {
    Routes,
    Config,
    Roles,
    Users,
    Help,
}

/// One classified input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShellInput<'a> {
    Empty,
    Quit,
    Meta(MetaCommand),
    UnknownMeta(&'a str),
    Sql(&'a str),
}

pub(crate) fn parse_line(line: &str) -> ShellInput<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ShellInput::Empty,
        "\\q" | "exit" | "quit" => ShellInput::Quit,
        "\\routes" => ShellInput::Meta(MetaCommand::Routes),
        "\\config" => ShellInput::Meta(MetaCommand::Config),
        "\\roles" => ShellInput::Meta(MetaCommand::Roles),
        "\\users" => ShellInput::Meta(MetaCommand::Users),
        "\\help" | "\\?" => ShellInput::Meta(MetaCommand::Help),
        other if other.starts_with('\\') => ShellInput::UnknownMeta(other),
        sql => ShellInput::Sql(sql),
    }
}

pub(crate) async fn handle_shell(ctx: &CommandContext) -> CliResult<()> {
    let db = ctx.database().await?;
    let table = route_table().map_err(CliError::failure)?;
    let session = ShellSession {
        config: ctx.config(),
        db,
        routes: table.entries(),
    };
    let mut stdout = io::stdout();
    session
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await
}

/// Bindings available to the shell.
pub(crate) struct ShellSession<'a> {
    pub(crate) config: &'a AppConfig,
    pub(crate) db: &'a Database,
    pub(crate) routes: &'a [RouteEntry],
}

impl ShellSession<'_> {
    /// Read and evaluate lines from `input` until it ends or the operator quits.
    pub(crate) async fn run<R, W>(&self, input: R, out: &mut W) -> CliResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(
            out,
            "Keystone shell ({} profile). Type \\help for commands.",
            self.config.profile
        )
        .map_err(write_failure)?;
        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}").map_err(write_failure)?;
            out.flush().map_err(write_failure)?;
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|err| io_failure("read shell input", err))?
            else {
                writeln!(out).map_err(write_failure)?;
                break;
            };
            match parse_line(&line) {
                ShellInput::Empty => {}
                ShellInput::Quit => break,
                ShellInput::Meta(command) => self.meta(command, out).await?,
                ShellInput::UnknownMeta(name) => {
                    writeln!(out, "unknown command {name}; type \\help for a list")
                        .map_err(write_failure)?;
                }
                ShellInput::Sql(sql) => self.statement(sql, out).await?,
            }
        }
        Ok(())
    }

    async fn meta<W: Write>(&self, command: MetaCommand, out: &mut W) -> CliResult<()> {
        let text = match command {
            MetaCommand::Routes => render_routes(self.routes),
            MetaCommand::Config => self
                .config
                .summary()
                .into_iter()
                .map(|(key, value)| format!("{key} = {value}\n"))
                .collect(),
            MetaCommand::Roles => match self.db.list_roles().await {
                Ok(roles) => roles
                    .iter()
                    .map(|role| {
                        format!(
                            "{:>3}  {:<14} permissions={:<3} default={}\n",
                            role.id, role.name, role.permissions, role.is_default
                        )
                    })
                    .collect(),
                Err(err) => format!("error: {}\n", error_chain(&err)),
            },
            MetaCommand::Users => match self.db.list_users().await {
                Ok(users) => users
                    .iter()
                    .map(|user| {
                        format!(
                            "{:>3}  {:<16} {:<24} role={} confirmed={}\n",
                            user.id,
                            user.username,
                            user.email,
                            user.role_name.as_deref().unwrap_or("-"),
                            user.confirmed
                        )
                    })
                    .collect(),
                Err(err) => format!("error: {}\n", error_chain(&err)),
            },
            MetaCommand::Help => HELP.to_string(),
        };
        out.write_all(text.as_bytes()).map_err(write_failure)
    }

    async fn statement<W: Write>(&self, sql: &str, out: &mut W) -> CliResult<()> {
        debug!(statement = sql, "shell statement");
        let text = match self.db.execute_statement(sql).await {
            Ok(StatementOutcome::Rows(rows)) => {
                let mut text: String = rows.iter().map(|row| format!("{row}\n")).collect();
                text.push_str(&format!("({} rows)\n", rows.len()));
                text
            }
            Ok(StatementOutcome::Affected(count)) => format!("OK, {count} rows affected\n"),
            Err(err) => format!("error: {}\n", error_chain(&err)),
        };
        out.write_all(text.as_bytes()).map_err(write_failure)
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn write_failure(err: io::Error) -> CliError {
    io_failure("write shell output", err)
}
