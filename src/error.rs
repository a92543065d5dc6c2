use midea_ac::ControlError;
use midea_dongle_core::SchedulerError;
use thiserror::Error;

/// Aggregate error type surfaced by [`crate::MideaAcSession`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Control(#[from] ControlError),

    /// The caller-supplied transport failed outside the core's own framing
    /// and retry handling (e.g. the underlying serial device disappeared).
    #[error("transport error: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),
}
