//! Named configuration profiles.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ConfigError;

/// Environment variable that selects the configuration profile.
pub const CONFIG_SELECTOR_ENV: &str = "KEYSTONE_CONFIG";

/// Fallback database URL consulted by every profile.
pub(crate) const SHARED_DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Configuration profiles an application instance can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigProfile {
    /// Local development; verbose logging.
    Development,
    /// Test runs; points at the disposable test database.
    Testing,
    /// Production deployment.
    Production,
}

impl ConfigProfile {
    /// Profile used when the selector is unset or names `default`.
    pub const DEFAULT: Self = Self::Development;

    /// Resolve the selector value, treating an unset or blank value as `default`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] when the name is not recognised.
    pub fn select(selector: Option<&str>) -> Result<Self, ConfigError> {
        match selector.map(str::trim) {
            None | Some("") => Ok(Self::DEFAULT),
            Some(name) => name.parse(),
        }
    }

    /// Stable profile name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }

    /// Profile-specific database URL variable, consulted before `DATABASE_URL`.
    #[must_use]
    pub const fn database_url_env(self) -> &'static str {
        match self {
            Self::Development => "KEYSTONE_DEV_DATABASE_URL",
            Self::Testing => "KEYSTONE_TEST_DATABASE_URL",
            Self::Production => "KEYSTONE_DATABASE_URL",
        }
    }

    /// Log level applied when `KEYSTONE_LOG_LEVEL` is not set.
    #[must_use]
    pub const fn default_log_level(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Testing | Self::Production => "info",
        }
    }
}

impl FromStr for ConfigProfile {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "default" => Ok(Self::Development),
            "testing" => Ok(Self::Testing),
            "production" => Ok(Self::Production),
            _ => Err(ConfigError::UnknownProfile {
                value: value.to_string(),
            }),
        }
    }
}

impl Display for ConfigProfile {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
