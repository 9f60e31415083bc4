//! Engine error reporting
//!
//! Failures inside a draw or measure call are never fatal: they are reported
//! through a registered callback and the call continues glyph by glyph.
//! Font registration failures use a sentinel return value instead.

use thiserror::Error;

/// Recoverable engine errors delivered through the error callback
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StashError {
    /// No free space in the atlas for a glyph bake.
    /// Recover by expanding or resetting the atlas and redrawing.
    #[error("glyph atlas full ({0} bytes requested)")]
    AtlasFull(usize),

    /// A glyph bitmap exceeded the staging scratch buffer
    /// (`SCRATCH_BUF_SIZE`). The glyph is skipped.
    #[error("scratch buffer full ({0} bytes requested)")]
    ScratchFull(usize),

    /// `push_state` at maximum stack depth; the push is a no-op.
    #[error("render state stack overflow")]
    StatesOverflow,

    /// `pop_state` with a single remaining state; the pop is a no-op.
    #[error("render state stack underflow")]
    StatesUnderflow,
}

/// Callback invoked at the point of failure
pub type ErrorCallback = Box<dyn FnMut(StashError)>;
