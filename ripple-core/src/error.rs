//! Error types.
//!
//! The tracking engine treats "nothing is listening" as a normal outcome, so
//! almost every operation is infallible. Errors only surface through the strict
//! entry points such as [`Runtime::try_trigger`](crate::reactive::Runtime::try_trigger),
//! which collaborators use to catch writes that no read could have observed.

use thiserror::Error;

use crate::reactive::{ObjectId, PropertyKey};

/// Errors reported by the strict registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// No read of any key on this target was ever tracked.
    #[error("no tracked reads for {target}")]
    UntrackedTarget { target: ObjectId },

    /// The target is known, but this key was never tracked on it.
    #[error("no tracked reads for key `{key}` on {target}")]
    UntrackedKey { target: ObjectId, key: PropertyKey },
}

/// Result alias for the strict registry operations.
pub type Result<T> = std::result::Result<T, ReactiveError>;
