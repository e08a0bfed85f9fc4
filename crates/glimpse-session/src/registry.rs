//! Identity lifecycle over a transport endpoint.

use std::sync::atomic::{AtomicBool, Ordering};

use glimpse_common::{MediaStream, PeerId};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::transport::{CallHandle, Endpoint, Transport, TransportError, TransportEvent};

/// Owns the local peer identity and its lifecycle.
///
/// A registry registers exactly once at construction and hands back the
/// endpoint's event stream. After [`IdentityRegistry::close`] the identity is
/// invalid: connects become no-ops and calls yield dead handles, so late
/// completions from a torn-down controller cannot reach the transport.
pub struct IdentityRegistry {
    endpoint: Box<dyn Endpoint>,
    closed: AtomicBool,
}

impl IdentityRegistry {
    /// Register with the transport. Exactly one registration per instance;
    /// on failure the caller constructs a new registry, there is no retry.
    pub async fn open(
        transport: &dyn Transport,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let (endpoint, events) = transport.open().await?;
        info!(id = %endpoint.local_id(), "peer identity registered");
        let registry = Self {
            endpoint,
            closed: AtomicBool::new(false),
        };
        Ok((registry, events))
    }

    /// The identity the transport assigned.
    pub fn local_id(&self) -> &PeerId {
        self.endpoint.local_id()
    }

    /// Open a signaling connection to `peer`. No media flows.
    pub async fn connect(&self, peer: &PeerId) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.endpoint.connect(peer).await;
    }

    /// Push `stream` to `peer`. Yields a dead handle once closed, or when
    /// the peer already departed.
    pub async fn call(&self, peer: &PeerId, stream: MediaStream) -> CallHandle {
        if self.closed.load(Ordering::SeqCst) {
            return CallHandle::dead(peer.clone());
        }
        self.endpoint.call(peer, stream).await
    }

    /// Tear down every connection and call and release the identity.
    /// Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(id = %self.endpoint.local_id(), "registry closed");
        self.endpoint.close().await;
    }
}
