use std::process::{Command, Output, Stdio};

use anyhow::Result;

const UNREACHABLE_DB: &str = "postgres://keystone@127.0.0.1:1/keystone";

fn manage(args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_keystone-manage"));
    command
        .args(args)
        .env_clear()
        .env("RUST_LOG", "off")
        .stdin(Stdio::null());
    for (key, value) in env {
        command.env(key, value);
    }
    Ok(command.output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_documented_options_without_configuration() -> Result<()> {
    let cases: [(&str, &[&str]); 8] = [
        ("create_db", &[]),
        ("drop_db", &[]),
        ("shell", &[]),
        ("test", &["--coverage"]),
        ("routes", &[]),
        ("db_upgrade", &[]),
        ("createsuperuser", &["--email", "--username", "--password"]),
        ("profile", &["--length", "--profile-dir"]),
    ];
    for (name, options) in cases {
        let output = manage(&[name, "--help"], &[])?;
        assert_eq!(output.status.code(), Some(0), "{name} --help");
        let text = stdout(&output);
        for option in options {
            assert!(text.contains(option), "{name} help should mention {option}");
        }
        let listed = text
            .lines()
            .filter(|line| line.trim_start().starts_with("--"))
            .count();
        assert_eq!(listed, options.len(), "{name} help lists extra options");
    }
    Ok(())
}

#[test]
fn routes_prints_one_line_per_rule_without_a_database() -> Result<()> {
    let output = manage(&["routes"], &[])?;
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        [
            "/health",
            "/api/v1/roles",
            "/api/v1/users",
            "/api/v1/users/{username}"
        ]
    );
    Ok(())
}

#[test]
fn missing_database_url_is_a_validation_error() -> Result<()> {
    let output = manage(&["create_db"], &[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("error: missing environment configuration"));
    Ok(())
}

#[test]
fn schema_commands_confirm_on_stdout() -> Result<()> {
    let postgres = match keystone_test_support::start_postgres() {
        Ok(postgres) => postgres,
        Err(err) => {
            eprintln!("skipping schema command test: {err:#}");
            return Ok(());
        }
    };
    let env = [("DATABASE_URL", postgres.connection_string())];
    let expected = [
        ("create_db", "Database created successfully."),
        ("db_upgrade", "Database upgrade complete."),
        ("drop_db", "Database dropped successfully."),
        ("drop_db", "Database dropped successfully."),
    ];
    for (command, confirmation) in expected {
        let output = manage(&[command], &env)?;
        assert_eq!(
            output.status.code(),
            Some(0),
            "{command}: {}",
            stderr(&output)
        );
        assert_eq!(stdout(&output).trim_end(), confirmation, "{command}");
    }
    Ok(())
}

#[test]
fn unknown_profile_is_a_validation_error() -> Result<()> {
    let output = manage(
        &["routes"],
        &[("KEYSTONE_CONFIG", "staging"), ("DATABASE_URL", UNREACHABLE_DB)],
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("`staging`"));
    Ok(())
}

#[test]
fn createsuperuser_without_terminal_requires_every_flag() -> Result<()> {
    let output = manage(
        &["createsuperuser", "--email", "a@x.com", "--username", "admin"],
        &[("DATABASE_URL", UNREACHABLE_DB)],
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--password is required"));
    Ok(())
}

#[test]
fn unknown_command_is_a_usage_error() -> Result<()> {
    let output = manage(&["runserver"], &[])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}
