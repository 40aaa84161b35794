//! Error types for task registration and scheduler control
//!
//! Task producers themselves fail with `anyhow::Error`; those failures are
//! caught per tick and surfaced as error events, never as panics or as a
//! stop of the scheduler. The types here cover the caller-facing failures
//! that must be reported immediately.

use thiserror::Error;

/// Errors raised when registering a task
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// A task with this name already exists
    #[error("a task named '{0}' is already registered")]
    DuplicateName(String),

    /// The name collides with the reserved snapshot key
    #[error("'{0}' is reserved for the server identity field")]
    ReservedName(String),

    /// Registration attempted while the tick loop is active
    #[error("tasks cannot be registered while the scheduler is running")]
    SchedulerRunning,
}

/// Errors raised when controlling the scheduler
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    /// `start` was called with a zero interval
    #[error("publication interval must be greater than zero")]
    InvalidInterval,
}
