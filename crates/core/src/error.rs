//! Error types for Arbor tree operations.

use alloc::string::String;
use core::fmt;

/// Result type alias for Arbor operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for tree addressing and propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed path text.
    InvalidPath {
        path: String,
        message: &'static str,
    },
    /// A deeper segment was requested through a node holding a
    /// non-composite value.
    NotComposite {
        path: String,
        segment: String,
    },
    /// The bounded tick-depth guard tripped; almost always a hook wired to
    /// an observable derived from its own subtree.
    TickOverflow {
        depth: usize,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPath { path, message } => {
                write!(f, "Invalid path {:?}: {}", path, message)
            }
            Error::NotComposite { path, segment } => {
                write!(
                    f,
                    "Cannot resolve segment {:?} through non-composite value at {:?}",
                    segment, path
                )
            }
            Error::TickOverflow { depth } => {
                write!(f, "Propagation tick depth exceeded {}", depth)
            }
            Error::InvalidOperation { message } => {
                write!(f, "Invalid operation: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: &'static str) -> Self {
        Error::InvalidPath {
            path: path.into(),
            message,
        }
    }

    /// Creates a non-composite traversal error.
    pub fn not_composite(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::NotComposite {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Creates a tick overflow error.
    pub fn tick_overflow(depth: usize) -> Self {
        Error::TickOverflow { depth }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_path("a..b", "empty path segment");
        assert!(err.to_string().contains("a..b"));

        let err = Error::not_composite("counter", "digits");
        assert!(err.to_string().contains("digits"));
        assert!(err.to_string().contains("counter"));

        let err = Error::tick_overflow(64);
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_error_constructors() {
        match Error::not_composite("a", "b") {
            Error::NotComposite { path, segment } => {
                assert_eq!(path, "a");
                assert_eq!(segment, "b");
            }
            _ => panic!("Wrong error type"),
        }
    }
}
