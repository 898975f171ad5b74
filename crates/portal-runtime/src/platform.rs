//! Platform abstraction for the Portal runtime.
//!
//! The runtime never drives frames on its own. It asks the host to schedule
//! one whenever a component scope is invalidated and leaves it to the host to
//! call [`Composition::process_invalid_scopes`](crate::Composition::process_invalid_scopes).

/// Schedules work for the Portal runtime.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}
