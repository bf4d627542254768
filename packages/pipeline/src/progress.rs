//! Stage progress hooks.
//!
//! Geocoding batches and per-tweet county extraction report here; the CLI
//! draws bars from it and tests pass [`null_progress`].

use std::sync::Arc;

/// Sink for the progress of one pipeline stage.
pub trait ProgressCallback: Send + Sync {
    /// Number of tweets (or stages) the work covers.
    fn set_total(&self, total: u64);

    /// Jumps to an absolute position.
    fn set_position(&self, pos: u64);

    /// Moves forward by `delta`.
    fn inc(&self, delta: u64);

    /// Replaces the status text.
    fn set_message(&self, msg: String);

    /// Ends the stage, leaving `msg` visible.
    fn finish(&self, msg: String);

    /// Ends the stage without leaving anything behind.
    fn finish_and_clear(&self);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
