//! CLI error type and exit codes.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use keystone_config::{CONFIG_SELECTOR_ENV, ConfigError};
use keystone_data::DataError;

/// Exit code for invalid options, configuration, or prompt input.
pub(crate) const EXIT_VALIDATION: i32 = 2;
/// Exit code for storage, migration, and IO failures.
pub(crate) const EXIT_FAILURE: i32 = 3;

const PROFILE_CHOICES: &str = "development, testing, production, or default";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => EXIT_VALIDATION,
            Self::Failure(_) => EXIT_FAILURE,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let message = match &err {
            ConfigError::UnknownProfile { value } => {
                format!("{err} `{value}`; set {CONFIG_SELECTOR_ENV} to {PROFILE_CHOICES}")
            }
            ConfigError::MissingEnv { name } => format!("{err}: set {name}"),
            ConfigError::InvalidField {
                field,
                value,
                reason,
            } => format!("{err}: {field}={value:?} {reason}"),
        };
        Self::validation(message)
    }
}

impl From<DataError> for CliError {
    fn from(err: DataError) -> Self {
        Self::failure(err)
    }
}

/// Wrap an IO error with a short description of what was attempted.
pub(crate) fn io_failure(action: &str, err: std::io::Error) -> CliError {
    CliError::failure(anyhow!(err).context(format!("failed to {action}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_validation_from_failure() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("down")).exit_code(), 3);
    }

    #[test]
    fn failure_message_includes_source_chain() {
        let err = CliError::from(DataError::RoleMissing {
            name: "Administrator".into(),
        });
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(err.display_message(), "role `Administrator` does not exist");

        let io = io_failure(
            "read input",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed"),
        );
        assert_eq!(io.display_message(), "failed to read input: closed");
    }

    #[test]
    fn config_errors_are_validation_errors() {
        let err = CliError::from(ConfigError::UnknownProfile {
            value: "staging".into(),
        });
        assert_eq!(err.exit_code(), EXIT_VALIDATION);
        assert!(err.display_message().contains("`staging`"));

        let missing = CliError::from(ConfigError::MissingEnv {
            name: "DATABASE_URL".into(),
        });
        assert_eq!(
            missing.display_message(),
            "missing environment configuration: set DATABASE_URL"
        );
    }
}
