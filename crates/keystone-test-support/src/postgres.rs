//! Disposable Postgres databases for integration tests.
//!
//! A database is carved out of an existing server named by
//! `KEYSTONE_TEST_DATABASE_URL`; without it, a throwaway server is started from
//! local Postgres binaries. Callers skip their test when neither is possible.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ::postgres::NoTls;
use anyhow::{Context, Result, bail};
use url::Url;

/// Environment variable naming an existing server to create test databases on.
pub const TEST_DATABASE_URL_ENV: &str = "KEYSTONE_TEST_DATABASE_URL";

const READY_ATTEMPTS: usize = 30;
const READY_INTERVAL: Duration = Duration::from_millis(200);

/// A uniquely named database that is dropped (with its server, if local) on drop.
pub struct TestDatabase {
    url: String,
    admin_url: String,
    name: String,
    server: Option<LocalServer>,
}

impl TestDatabase {
    /// Connection string for the test database.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.url
    }

    /// Name of the created database.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let _ = run_admin(&self.admin_url, format!("DROP DATABASE IF EXISTS \"{}\"", self.name));
        // The local server (if any) shuts down after the database is gone.
        self.server.take();
    }
}

struct LocalServer {
    process: Child,
    data_dir: PathBuf,
}

impl Drop for LocalServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
        let _ = fs::remove_dir_all(&self.data_dir);
    }
}

/// Provision a fresh test database.
///
/// # Errors
///
/// Returns an error when no server URL is configured and local Postgres
/// binaries are unavailable or fail to start.
pub fn start_postgres() -> Result<TestDatabase> {
    if let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) {
        return create_database_on(&url, None);
    }

    let (base_url, server) = start_local_server()?;
    create_database_on(&base_url, Some(server))
}

fn create_database_on(base_url: &str, server: Option<LocalServer>) -> Result<TestDatabase> {
    let parsed = Url::parse(base_url).context("invalid postgres connection url")?;
    let name = unique_database_name();

    let mut admin = parsed.clone();
    admin.set_path("/postgres");
    let mut candidates = vec![admin.to_string()];
    if admin.path() != parsed.path() {
        candidates.push(parsed.to_string());
    }

    let mut last_error = None;
    for admin_url in candidates {
        match run_admin(&admin_url, format!("CREATE DATABASE \"{name}\"")) {
            Ok(()) => {
                let mut url = parsed;
                url.set_path(&format!("/{name}"));
                return Ok(TestDatabase {
                    url: url.to_string(),
                    admin_url,
                    name,
                    server,
                });
            }
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("failed to create test database")))
}

/// Run one administrative statement on a dedicated thread.
///
/// The sync client spins its own runtime, which must not nest inside the
/// async test runtime calling us.
fn run_admin(admin_url: &str, statement: String) -> Result<()> {
    let admin_url = admin_url.to_string();
    thread::spawn(move || -> Result<()> {
        let config = ::postgres::Config::from_str(&admin_url)?;
        let mut client = config.connect(NoTls)?;
        client
            .simple_query(&statement)
            .map(|_| ())
            .with_context(|| format!("failed to run `{statement}`"))
    })
    .join()
    .unwrap_or_else(|_| Err(anyhow::anyhow!("admin statement thread panicked")))
}

fn start_local_server() -> Result<(String, LocalServer)> {
    let initdb = find_binary("initdb")?;
    let postgres = find_binary("postgres")?;
    let pg_isready = find_binary("pg_isready")?;

    let port = free_port()?;
    let data_dir = fresh_data_dir()?;
    let data_dir_str = data_dir
        .to_str()
        .context("data dir contains non-utf8 characters")?
        .to_string();

    let status = Command::new(&initdb)
        .args(["-D", &data_dir_str, "--username=postgres", "--auth=trust"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to run initdb")?;
    if !status.success() {
        bail!("initdb exited with failure status");
    }

    let process = Command::new(&postgres)
        .args(["-D", &data_dir_str, "-p", &port.to_string(), "-h", "127.0.0.1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to start postgres process")?;
    let server = LocalServer { process, data_dir };

    wait_until_ready(&pg_isready, port)?;
    Ok((format!("postgres://postgres@127.0.0.1:{port}/postgres"), server))
}

fn find_binary(name: &str) -> Result<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map_or_else(Vec::new, |paths| std::env::split_paths(&paths).collect());
    dirs.extend(
        ["/usr/lib/postgresql/16/bin", "/usr/local/bin", "/opt/homebrew/bin"]
            .into_iter()
            .map(PathBuf::from),
    );

    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
        .with_context(|| format!("{name} binary is required for Postgres tests"))
}

fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("failed to reserve port")?;
    Ok(listener
        .local_addr()
        .context("failed to read listener address")?
        .port())
}

fn fresh_data_dir() -> Result<PathBuf> {
    let base = Path::new("tmp/postgres");
    fs::create_dir_all(base)
        .with_context(|| format!("failed to create base dir {}", base.display()))?;
    let dir = base.join(format!("keystone-pg-{}", unique_suffix()));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data dir {}", dir.display()))?;
    Ok(dir)
}

fn wait_until_ready(pg_isready: &Path, port: u16) -> Result<()> {
    for _ in 0..READY_ATTEMPTS {
        let ready = Command::new(pg_isready)
            .args(["-h", "127.0.0.1", "-p", &port.to_string(), "-U", "postgres"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success());
        if ready {
            return Ok(());
        }
        thread::sleep(READY_INTERVAL);
    }
    bail!("postgres process did not become ready in time")
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}_{nanos}", std::process::id())
}

fn unique_database_name() -> String {
    format!("keystone_test_{}", unique_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_unique_and_quotable() {
        let first = unique_database_name();
        let second = unique_database_name();
        assert_ne!(first, second);
        assert!(first.starts_with("keystone_test_"));
        assert!(
            first
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        );
    }

    #[test]
    fn missing_binary_is_reported() {
        let err = find_binary("definitely-not-a-postgres-binary");
        assert!(err.is_err());
    }
}
