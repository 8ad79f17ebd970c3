// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for marshaling and unmarshaling.
//!
//! Every operation is all-or-nothing: when an error is returned the caller
//! discards whatever was written to the output stream.

use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// The value was rejected by `validate()` before any byte was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The wire content (or the value being written) is structurally invalid.
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// A host callback failed. The original error is carried unchanged.
    #[error(transparent)]
    Abort(#[from] HostError),

    /// A type was used before it was defined, or a definition is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Build a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a generic malformed-content error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Marshal(MarshalError::Malformed(msg.into()))
    }

    /// `true` when no bytes were written and the call can be retried with a
    /// corrected value.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the host error if this error aborted a host callback.
    pub fn as_host(&self) -> Option<&HostError> {
        match self {
            Self::Abort(e) => Some(e),
            _ => None,
        }
    }
}

/// Structural marshaling failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarshalError {
    #[error("unexpected end of buffer at offset {offset} (need {need} bytes, have {have})")]
    UnexpectedEnd {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("invalid size {0}")]
    InvalidSize(i32),

    #[error("enumerator {value} out of range for `{type_id}`")]
    EnumeratorOutOfRange { type_id: String, value: i32 },

    #[error("invalid optional member with tag {tag}: {reason}")]
    InvalidOptional { tag: i32, reason: String },

    #[error("expected element of type `{expected}` but received `{actual}`")]
    UnexpectedType { expected: String, actual: String },

    #[error("no value factory found for type `{0}`")]
    NoValueFactory(String),

    #[error("unknown user exception `{0}`")]
    UnknownUserException(String),

    #[error("maximum class graph depth reached ({0})")]
    ClassGraphDepthExceeded(usize),

    #[error("expected {expected} values but received {actual}")]
    TupleArity { expected: usize, actual: usize },

    #[error("unsupported encoding {major}.{minor}")]
    UnsupportedEncoding { major: u8, minor: u8 },

    #[error("{0}")]
    Malformed(String),
}

/// Error raised by a host callback (container factory, value factory).
///
/// The engine never reinterprets it: it travels up as [`Error::Abort`] and
/// the caller can recover the original with [`HostError::into_inner`].
pub struct HostError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl HostError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(error.into())
    }

    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_variants() {
        let err = Error::from(MarshalError::UnexpectedEnd {
            offset: 12,
            need: 4,
            have: 1,
        });
        assert_eq!(
            err.to_string(),
            "marshal error: unexpected end of buffer at offset 12 (need 4 bytes, have 1)"
        );

        let err = Error::from(MarshalError::EnumeratorOutOfRange {
            type_id: "::Test::Color".into(),
            value: 7,
        });
        assert_eq!(
            err.to_string(),
            "marshal error: enumerator 7 out of range for `::Test::Color`"
        );

        assert_eq!(
            Error::validation("bad").to_string(),
            "validation failed: bad"
        );
    }

    #[test]
    fn test_host_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "factory exploded");
        let err = Error::from(HostError::new(io));
        assert_eq!(err.to_string(), "factory exploded");

        let inner = match err {
            Error::Abort(host) => host.into_inner(),
            other => panic!("unexpected error {other:?}"),
        };
        let io = inner
            .downcast::<std::io::Error>()
            .expect("original error type should survive");
        assert_eq!(io.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_only_validation_is_retryable() {
        assert!(Error::validation("x").is_retryable());
        assert!(!Error::malformed("x").is_retryable());
        assert!(!Error::configuration("x").is_retryable());
    }
}
