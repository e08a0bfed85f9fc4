//! States, events, and commands for the host controller.

use glimpse_common::{MediaStream, PeerId};

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Lifecycle of a hosted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// Not started.
    Idle,
    /// Waiting for the transport to assign an identity.
    Registering,
    /// Registered, no viewers attached.
    Ready,
    /// Viewers are waiting and nothing is shared; the share prompt is
    /// pending a decision.
    AwaitingShare,
    /// Media is flowing to every attached viewer.
    Sharing,
    /// Session over. Final for this identity.
    Terminated,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by a hosted session.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Identity assigned; the room is reachable at this code.
    Registered { room: PeerId },
    /// The transport could not allocate an identity. Terminal.
    RegistrationFailed { reason: String },
    /// The number of distinct attached viewers changed.
    ViewerCountChanged { count: usize },
    /// Viewers are waiting and nothing is shared yet. Raised once per
    /// awaiting period; stays pending until acted on or the session ends.
    SharePromptRaised,
    /// A capture stream is now being pushed to every attached viewer.
    SharingStarted,
    /// The capture source ended the stream out from under us.
    CaptureEnded,
    /// The session is fully torn down.
    SessionEnded,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands consumed by the host loop.
#[derive(Debug)]
pub(crate) enum HostCommand {
    AcceptShare(MediaStream),
    Stop,
}
