//! Application configuration resolved from the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::profile::{CONFIG_SELECTOR_ENV, ConfigProfile, SHARED_DATABASE_URL_ENV};

/// Address the HTTP server binds to when `KEYSTONE_BIND` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
/// Pool size used when `KEYSTONE_DB_MAX_CONNECTIONS` is unset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const BIND_ENV: &str = "KEYSTONE_BIND";
const LOG_LEVEL_ENV: &str = "KEYSTONE_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "KEYSTONE_LOG_FORMAT";
const MAX_CONNECTIONS_ENV: &str = "KEYSTONE_DB_MAX_CONNECTIONS";
const PROJECT_ROOT_ENV: &str = "KEYSTONE_PROJECT_ROOT";
const COVERAGE_DIR: &str = "tmp/coverage";

/// Fully resolved configuration for one process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Selected profile.
    pub profile: ConfigProfile,
    /// `PostgreSQL` connection string, when one is configured.
    pub database_url: Option<String>,
    /// Socket address for the HTTP server.
    pub bind_addr: SocketAddr,
    /// Log level directive applied when `RUST_LOG` is unset.
    pub log_level: String,
    /// Requested log format name (`json` or `pretty`), if any.
    pub log_format: Option<String>,
    /// Maximum connections held by the storage pool.
    pub max_connections: u32,
    /// Root of the project checkout; anchors the test suite and reports.
    pub project_root: PathBuf,
    /// Whether the application runs in test mode.
    pub testing: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile is unknown or a value fails to parse.
    /// A missing database URL is reported later by
    /// [`AppConfig::require_database_url`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let profile = ConfigProfile::select(read(CONFIG_SELECTOR_ENV).as_deref())?;
        let database_url =
            read(profile.database_url_env()).or_else(|| read(SHARED_DATABASE_URL_ENV));

        let bind_raw = read(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidField {
                field: BIND_ENV,
                value: bind_raw.clone(),
                reason: "must be a socket address",
            })?;

        let max_connections = match read(MAX_CONNECTIONS_ENV) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidField {
                        field: MAX_CONNECTIONS_ENV,
                        value: raw,
                        reason: "must be a positive integer",
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match read(LOG_FORMAT_ENV) {
            Some(raw) => {
                let normalized = raw.trim().to_ascii_lowercase();
                if !matches!(normalized.as_str(), "json" | "pretty") {
                    return Err(ConfigError::InvalidField {
                        field: LOG_FORMAT_ENV,
                        value: raw,
                        reason: "must be `json` or `pretty`",
                    });
                }
                Some(normalized)
            }
            None => None,
        };

        let project_root = read(PROJECT_ROOT_ENV).map_or_else(|| PathBuf::from("."), PathBuf::from);

        let config = Self {
            profile,
            database_url,
            bind_addr,
            log_level: read(LOG_LEVEL_ENV)
                .unwrap_or_else(|| profile.default_log_level().to_string()),
            log_format,
            max_connections,
            project_root,
            testing: profile == ConfigProfile::Testing,
        };
        debug!(profile = %config.profile, bind = %config.bind_addr, "configuration resolved");
        Ok(config)
    }

    /// Database URL for commands that need storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] naming the profile variable and
    /// `DATABASE_URL` when neither is set.
    pub fn require_database_url(&self) -> ConfigResult<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv {
                name: format!(
                    "{} or {SHARED_DATABASE_URL_ENV}",
                    self.profile.database_url_env()
                ),
            })
    }

    /// Directory the HTML coverage report is written to.
    #[must_use]
    pub fn coverage_dir(&self) -> PathBuf {
        self.project_root.join(COVERAGE_DIR)
    }

    /// Database URL with any embedded password masked, for display.
    #[must_use]
    pub fn redacted_database_url(&self) -> String {
        self.database_url
            .as_deref()
            .map_or_else(|| "(unset)".to_string(), redact_password)
    }

    /// Display-safe key/value pairs describing the configuration.
    #[must_use]
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("profile", self.profile.to_string()),
            ("database_url", self.redacted_database_url()),
            ("bind_addr", self.bind_addr.to_string()),
            ("log_level", self.log_level.clone()),
            (
                "log_format",
                self.log_format.clone().unwrap_or_else(|| "auto".to_string()),
            ),
            ("max_connections", self.max_connections.to_string()),
            ("project_root", self.project_root.display().to_string()),
            ("testing", self.testing.to_string()),
        ]
    }
}

fn redact_password(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    let credentials = &rest[..at];
    match credentials.split_once(':') {
        Some((user, _)) => format!(
            "{}{user}:***{}",
            &url[..authority_start],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
