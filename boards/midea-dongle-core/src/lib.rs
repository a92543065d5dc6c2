//! Appliance-agnostic outer framing, request scheduler and network-status
//! helpers shared by every Midea-family dongle protocol.
//!
//! This crate has no knowledge of any particular appliance's inner payload
//! format; that lives in a sibling crate such as `midea-ac`.

mod checksum;
mod error;
mod frame;
mod id;
mod network;
mod scheduler;
mod transport;

pub use error::SchedulerError;
pub use frame::{ApplianceId, Frame, FrameCodec, MessageType, HEADER_LENGTH, SYNC_BYTE};
pub use network::{rssi_to_level, LinkKind, LinkState, NetworkStatus};
pub use scheduler::{FailureCallback, MatchResult, Matcher, Request, Scheduler, SuccessCallback};
pub use transport::Transport;
