//! Error types for configuration loading.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The profile selector named a profile that does not exist.
    #[error("unknown configuration profile")]
    UnknownProfile {
        /// Profile name supplied by the operator.
        value: String,
    },
    /// A required environment variable was missing or empty.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the variable (or variables) consulted.
        name: String,
    },
    /// An environment variable held a value that could not be parsed.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment variable that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages_are_constant() {
        let unknown = ConfigError::UnknownProfile {
            value: "staging".into(),
        };
        assert_eq!(unknown.to_string(), "unknown configuration profile");

        let missing = ConfigError::MissingEnv {
            name: "DATABASE_URL".into(),
        };
        assert_eq!(missing.to_string(), "missing environment configuration");

        let invalid = ConfigError::InvalidField {
            field: "KEYSTONE_BIND",
            value: "nope".into(),
            reason: "must be a socket address",
        };
        assert_eq!(invalid.to_string(), "invalid configuration field");
    }
}
