//! # Error Types
//!
//! Recoverable errors are returned as values. Protocol violations are not:
//! they indicate a logic bug in a caller and go through
//! [`protocol_violation`], which logs and then panics.

use thiserror::Error;

use crate::memory::CorrelationId;
use crate::property::PayloadKind;

/// Errors reported by [`RequestPool`](crate::RequestPool) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was used before `start()` or after `stop()`.
    #[error("request pool is not started")]
    Uninitialized,

    /// `stop()` was called while requests were still issued or queued.
    #[error("cannot stop request pool: {count} request(s) still outstanding")]
    RequestsOutstanding {
        /// Number of requests not yet returned.
        count: usize,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Why a payload could not be read as a property's type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// The payload holds another kind.
    #[error("wrong payload kind")]
    WrongKind,
    /// The kind is right but the value does not fit the property type
    /// (an `i64` beyond `i32`, a `bool` other than 0 or 1).
    #[error("value out of range")]
    OutOfRange,
}

/// A request payload did not match the declared type of the property it
/// targeted.
///
/// The request is not consumed and the execution-side value is untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "type mismatch on property '{property}' ({correlation_id}): {reason}, expected {expected}, found {found}"
)]
pub struct TypeMismatch {
    /// Name of the property that matched the correlation id.
    pub property: &'static str,
    /// Correlation id carried by the request.
    pub correlation_id: CorrelationId,
    /// Payload kind the property stores.
    pub expected: PayloadKind,
    /// Payload kind the request carried.
    pub found: PayloadKind,
    /// What was wrong with the payload.
    pub reason: MismatchReason,
}

/// Errors from control-side writes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    /// No request object could be obtained.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The execution side has dropped its receiver.
    #[error("request queue closed: execution side is gone")]
    QueueClosed,
}

/// Result type for control-side writes.
pub type SetResult<T> = Result<T, SetError>;

/// Errors loading a [`TandemConfig`](crate::TandemConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but are not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Broken hand-off contract between the control and execution contexts.
///
/// Never returned. See [`protocol_violation`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// The pool handed out an object that was not marked as pooled.
    #[error("double get: request left the pool while already out of it")]
    DoubleGet,

    /// An object was returned to the pool while already pooled.
    #[error("double return: request returned while already in the pool")]
    DoubleReturn,

    /// A pooled object was read or written.
    #[error("request accessed while owned by the pool")]
    AccessWhilePooled,

    /// A request was returned to a pool that did not issue it.
    #[error("foreign return: request was not issued by this pool")]
    ForeignReturn,

    /// A request was applied without a destination.
    #[error("request {0} has no destination")]
    MissingDestination(CorrelationId),

    /// A request outlived the destination it targets.
    #[error("request {0} targets a destination that was already destroyed")]
    DestinationDropped(CorrelationId),
}

/// Reports a protocol violation and aborts the current operation.
///
/// Release builds are compiled with `panic = "abort"`, so this takes the
/// process down.
#[cold]
#[track_caller]
pub fn protocol_violation(violation: ProtocolViolation) -> ! {
    tracing::error!(%violation, "protocol violation");
    panic!("protocol violation: {violation}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_both_kinds() {
        let err = TypeMismatch {
            property: "alpha",
            correlation_id: CorrelationId::new(6),
            expected: PayloadKind::Float,
            found: PayloadKind::Text,
            reason: MismatchReason::WrongKind,
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains("wrong payload kind"));
        assert!(msg.contains("expected float"));
        assert!(msg.contains("found text"));
    }

    #[test]
    fn test_range_mismatch_is_distinguishable() {
        let err = TypeMismatch {
            property: "count",
            correlation_id: CorrelationId::new(1),
            expected: PayloadKind::Int,
            found: PayloadKind::Int,
            reason: MismatchReason::OutOfRange,
        };
        assert!(err.to_string().contains("value out of range"));
    }

    #[test]
    #[should_panic(expected = "protocol violation: double return")]
    fn test_violation_panics() {
        protocol_violation(ProtocolViolation::DoubleReturn);
    }
}
