//! # Error Types
//!
//! Errors surfaced by the execution-engine boundary.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Building a mirror never fails: values of unknown shape degrade to generic
//! object or `undefined` mirrors. The only fallible queries are the ones that
//! are anchored to a break episode (frames, evaluation), because the engine
//! must reject them once execution has moved on.

use thiserror::Error;

use crate::value::BreakId;

/// Main error type for mirror operations
///
/// ## Error Categories
///
/// 1. **Break episode errors**: StaleBreak, NotSuspended
/// 2. **Frame errors**: FrameOutOfRange, MalformedFrameDetails
/// 3. **Engine errors**: EvaluationFailed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError
{
    /// The break id does not belong to the current break episode
    ///
    /// Frame indices are only meaningful relative to the break in which they
    /// were produced. Once the debuggee has resumed (or stopped again) every
    /// query anchored to the old id is rejected rather than reinterpreted.
    #[error("Stale break id {requested} (current break is {current})")]
    StaleBreak
    {
        /// Break id carried by the query
        requested: BreakId,
        /// Break id of the current episode
        current: BreakId,
    },

    /// The debuggee is running, so there is no execution state to inspect
    #[error("Debuggee is not suspended")]
    NotSuspended,

    /// A frame index past the bottom of the stack
    #[error("Frame index {index} out of range (stack has {count} frames)")]
    FrameOutOfRange
    {
        /// Requested frame index (0 = innermost)
        index: usize,
        /// Number of frames in the current break
        count: usize,
    },

    /// The engine returned a frame details tuple that cannot be decoded
    #[error("Malformed frame details: {0}")]
    MalformedFrameDetails(String),

    /// Expression evaluation inside a frame failed in the engine
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Convenience type alias for `Result<T, MirrorError>`
///
/// ```rust
/// use mirage_core::error::MirrorResult;
/// fn foo() -> MirrorResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type MirrorResult<T> = std::result::Result<T, MirrorError>;
