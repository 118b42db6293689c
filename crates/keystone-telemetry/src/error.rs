//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// Serialising a request profile failed.
    ProfileSerialize {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// Creating the profile output directory failed.
    ProfileCreateDir {
        /// Directory path that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Writing a profile data file failed.
    ProfileWrite {
        /// File path that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install tracing subscriber")
            }
            Self::ProfileSerialize { .. } => formatter.write_str("failed to serialize profile"),
            Self::ProfileCreateDir { .. } => {
                formatter.write_str("failed to create profile output directory")
            }
            Self::ProfileWrite { .. } => formatter.write_str("failed to write profile data"),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::ProfileSerialize { source } => Some(source),
            Self::ProfileCreateDir { source, .. } | Self::ProfileWrite { source, .. } => {
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;
    use std::error::Error;
    use std::io;
    use tracing_subscriber::util::SubscriberInitExt;

    fn try_init_error()
    -> std::result::Result<tracing_subscriber::util::TryInitError, Box<dyn Error>> {
        match tracing_subscriber::registry().try_init() {
            Ok(()) => match tracing_subscriber::registry().try_init() {
                Ok(()) => Err(io::Error::other("expected init error").into()),
                Err(err) => Ok(err),
            },
            Err(err) => Ok(err),
        }
    }

    #[test]
    fn telemetry_error_display_and_source() -> std::result::Result<(), Box<dyn Error>> {
        let init_error = try_init_error()?;
        let cases = vec![
            (
                TelemetryError::SubscriberInstall { source: init_error },
                "failed to install tracing subscriber",
            ),
            (
                TelemetryError::ProfileSerialize {
                    source: serde_json::Error::custom("bad"),
                },
                "failed to serialize profile",
            ),
            (
                TelemetryError::ProfileCreateDir {
                    path: PathBuf::from("profiles"),
                    source: io::Error::other("io"),
                },
                "failed to create profile output directory",
            ),
            (
                TelemetryError::ProfileWrite {
                    path: PathBuf::from("profiles/GET.root.1ms.0.json"),
                    source: io::Error::other("io"),
                },
                "failed to write profile data",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(err.source().is_some());
        }
        Ok(())
    }
}
