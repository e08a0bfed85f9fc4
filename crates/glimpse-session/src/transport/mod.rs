//! Transport seam between the session controllers and the peer network.
//!
//! Controllers only ever speak to [`Transport`] and [`Endpoint`], so the real
//! signaling stack stays swappable. [`MemoryTransport`] is the in-process
//! implementation used by tests and the loopback demo.

mod memory;

pub use memory::MemoryTransport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use glimpse_common::{MediaStream, PeerId};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure at the transport boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The transport could not allocate a peer identity. Fatal to the
    /// endpoint that requested it; there is no automatic retry.
    #[error("registration failed: {0}")]
    Registration(String),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events delivered on an endpoint's receive stream.
///
/// Delivery preserves causal order per remote peer (a peer's open always
/// precedes its own close); nothing is guaranteed across distinct peers.
#[derive(Debug)]
pub enum TransportEvent {
    /// A signaling connection with `peer` is up, whichever side dialed.
    ConnectionOpened { peer: PeerId },
    /// The signaling connection with `peer` is gone.
    ConnectionClosed { peer: PeerId },
    /// A remote peer is offering media.
    CallReceived { call: IncomingCall },
    /// Transport-level failure, e.g. dialing an unknown peer.
    Error { message: String },
}

/// An inbound media offer. Answering accepts the media.
#[derive(Debug)]
pub struct IncomingCall {
    caller: PeerId,
    stream: MediaStream,
}

impl IncomingCall {
    pub fn new(caller: PeerId, stream: MediaStream) -> Self {
        Self { caller, stream }
    }

    pub fn caller(&self) -> &PeerId {
        &self.caller
    }

    /// Accept the call, taking ownership of the offered stream.
    pub fn answer(self) -> MediaStream {
        self.stream
    }
}

// ---------------------------------------------------------------------------
// Call handles
// ---------------------------------------------------------------------------

/// Caller-side handle to one outbound media push.
///
/// Calling a peer that already left is not an error; it yields a handle that
/// is closed from the start, and liveness is observed through
/// [`CallHandle::is_closed`] rather than a synchronous failure.
#[derive(Debug, Clone)]
pub struct CallHandle {
    peer: PeerId,
    closed: Arc<AtomicBool>,
}

impl CallHandle {
    pub fn new(peer: PeerId) -> Self {
        Self {
            peer,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for a call that never went anywhere.
    pub fn dead(peer: PeerId) -> Self {
        let handle = Self::new(peer);
        handle.close();
        handle
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    /// Stop pushing media on this call. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Factory for registered endpoints.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Register a fresh identity with the transport. Exactly one
    /// registration per endpoint; the receiver carries every event addressed
    /// to that identity.
    async fn open(
        &self,
    ) -> Result<(Box<dyn Endpoint>, mpsc::Receiver<TransportEvent>), TransportError>;
}

/// A registered peer identity.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// The identity assigned at registration.
    fn local_id(&self) -> &PeerId;

    /// Open a signaling connection to `peer`. Carries no media; failures
    /// surface as [`TransportEvent::Error`] on the receive stream.
    async fn connect(&self, peer: &PeerId);

    /// Start pushing `stream` to `peer`. Never fails synchronously; calling
    /// a departed peer yields a dead handle.
    async fn call(&self, peer: &PeerId, stream: MediaStream) -> CallHandle;

    /// Tear down every connection and call and release the identity.
    /// Idempotent.
    async fn close(&self);
}
