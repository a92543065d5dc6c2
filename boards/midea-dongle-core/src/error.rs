use crate::frame::MessageType;

/// Errors surfaced by the scheduler to request callbacks.
///
/// There is deliberately no finer-grained framing/CRC/timeout taxonomy:
/// recovery from any of those is always "re-query later", so they all
/// collapse into `RequestFailed` once retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("request of type {message_type:?} failed after exhausting retries")]
    RequestFailed { message_type: MessageType },

    #[error("request cancelled")]
    Cancelled,
}
