//! # Design
//!
//! - One crate-level error type for router assembly and serving failures.
//! - Messages stay constant; operational context lives in fields.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::net::SocketAddr;

/// Result alias for API server operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Errors raised while assembling or serving the API.
#[derive(Debug)]
pub enum ApiServerError {
    /// A path was registered twice in the route table.
    DuplicateRoute {
        /// Path that was already registered.
        path: &'static str,
    },
    /// Binding the listener failed.
    Bind {
        /// Address attempted.
        addr: SocketAddr,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Serving the API failed.
    Serve {
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRoute { path } => write!(formatter, "route `{path}` registered twice"),
            Self::Bind { .. } => formatter.write_str("failed to bind api listener"),
            Self::Serve { .. } => formatter.write_str("api server terminated unexpectedly"),
        }
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateRoute { .. } => None,
            Self::Bind { source, .. } | Self::Serve { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn api_server_error_display_and_source() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().expect("valid addr");
        let bind = ApiServerError::Bind {
            addr,
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert_eq!(bind.to_string(), "failed to bind api listener");
        assert!(bind.source().is_some());

        let duplicate = ApiServerError::DuplicateRoute { path: "/health" };
        assert_eq!(duplicate.to_string(), "route `/health` registered twice");
        assert!(duplicate.source().is_none());

        let serve = ApiServerError::Serve {
            source: io::Error::other("reset"),
        };
        assert_eq!(serve.to_string(), "api server terminated unexpectedly");
    }
}
