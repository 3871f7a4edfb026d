/*!
 * Error Types
 * Centralized error handling with thiserror
 */

use crate::core::types::RoomId;
use thiserror::Error;

/// Scheduler/gateway error kinds.
///
/// Only `InvalidRequest` and `UnknownRoom` are ever returned to a caller of
/// `RequestGateway::submit`; `PersistenceFailure` and
/// `InternalInvariantViolation` are logged from inside the tick loop and
/// never escape it (see `scheduler::tick`).
#[derive(Error, Debug)]
pub enum HvacError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    #[error("detail recorder persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, HvacError>;
