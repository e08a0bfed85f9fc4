//! States, events, and commands for the viewer controller.

use glimpse_common::MediaStream;

/// Lifecycle of a viewer's attachment to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    /// Not started.
    Idle,
    /// Registering an identity and dialing the room.
    Connecting,
    /// Signaling connection up, no media yet.
    Connected,
    /// The host's stream is in hand.
    Streaming,
    /// Attempt over. Final; rejoining takes a fresh session.
    Disconnected,
}

/// Events emitted by a viewer session.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// Connected to the room; waiting for the host to share.
    Connected,
    /// The host's stream arrived (again, after a re-share).
    StreamReady { stream: MediaStream },
    /// The room was unreachable, or the transport failed before media.
    ConnectionFailed { reason: String },
    /// The host ended the session, or we left it.
    SessionEnded,
}

/// Commands consumed by the viewer loop.
#[derive(Debug)]
pub(crate) enum ViewerCommand {
    Leave,
}
