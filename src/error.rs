//! Error types.
//!
//! Two very different kinds of failure live here. [`RouteError`] is a
//! setup-time programming error: two registrations disagree about what sits at
//! one position of a path. [`Error`] is an infrastructure failure in the
//! server (binding a port, accepting a connection).
//!
//! A request that matches nothing is neither. It is an ordinary
//! [`Outcome::NotFound`](crate::Outcome::NotFound).

use std::fmt;

/// A conflict between path patterns registered for the same method.
///
/// At any one level of the tree a node holds either one variable child or any
/// number of literal children, never both. Every variant names the pattern
/// being registered and the segment that broke that rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route `{pattern}`: literal segment `{segment}` conflicts with existing variable `:{existing}`")]
    LiteralAfterVariable {
        pattern: String,
        segment: String,
        existing: String,
    },

    #[error("route `{pattern}`: variable `:{segment}` conflicts with existing literal segments at the same position")]
    VariableAfterLiteral { pattern: String, segment: String },

    #[error("route `{pattern}`: variable `:{segment}` conflicts with existing variable `:{existing}`")]
    ConflictingVariable {
        pattern: String,
        segment: String,
        existing: String,
    },
}

/// The error type returned by the server's fallible operations.
///
/// Application-level errors (401, 404, etc.) are written to the
/// [`Response`](crate::Response) sink, not returned as `Error`s.
#[derive(Debug)]
pub struct Error(std::io::Error);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io: {}", self.0)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(e)
    }
}
