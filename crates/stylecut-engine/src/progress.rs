//! Caller-supplied progress reporting.
//!
//! Long-running steps narrate coarse progress through an append-only
//! message sink. This is a UX affordance, not a scheduling primitive:
//! degradable and recoverable failures are reported here, only fatal
//! failures surface as errors.

use tracing::info;

/// Append-only message sink for coarse pipeline progress.
pub trait ProgressSink: Send + Sync {
    /// Append one progress message.
    fn log(&self, message: &str);
}

/// Sink that forwards messages to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn log(&self, message: &str) {
        info!("{message}");
    }
}

/// Sink that discards all messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn log(&self, _message: &str) {}
}

/// Sink wrapping a message callback.
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        (self.0)(message)
    }
}
