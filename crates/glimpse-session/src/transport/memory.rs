//! In-process transport: a rendezvous hub that routes signaling events and
//! calls between endpoints living in the same process. Stands in for a real
//! signaling network in tests and the loopback demo.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use glimpse_common::{new_id, MediaStream, PeerId};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::{CallHandle, Endpoint, IncomingCall, Transport, TransportError, TransportEvent};

const EVENT_BUFFER: usize = 256;

struct PeerSlot {
    event_tx: mpsc::Sender<TransportEvent>,
    connections: HashSet<PeerId>,
}

#[derive(Default)]
struct Hub {
    peers: HashMap<PeerId, PeerSlot>,
}

/// In-memory rendezvous hub.
///
/// Cloning yields another handle to the same hub, so a host and its viewers
/// register against one shared network. All routing happens under the hub
/// lock, which keeps event delivery FIFO per receiver.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    hub: Arc<Mutex<Hub>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(
        &self,
    ) -> Result<(Box<dyn Endpoint>, mpsc::Receiver<TransportEvent>), TransportError> {
        let id = PeerId::new(new_id());
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut hub = self.hub.lock().await;
        hub.peers.insert(
            id.clone(),
            PeerSlot {
                event_tx,
                connections: HashSet::new(),
            },
        );
        debug!(peer = %id, "registered with memory hub");
        let endpoint = MemoryEndpoint {
            id,
            hub: Arc::clone(&self.hub),
        };
        Ok((Box::new(endpoint), event_rx))
    }
}

struct MemoryEndpoint {
    id: PeerId,
    hub: Arc<Mutex<Hub>>,
}

#[async_trait]
impl Endpoint for MemoryEndpoint {
    fn local_id(&self) -> &PeerId {
        &self.id
    }

    async fn connect(&self, peer: &PeerId) {
        let mut hub = self.hub.lock().await;
        if !hub.peers.contains_key(&self.id) {
            return;
        }
        if !hub.peers.contains_key(peer) {
            debug!(peer = %peer, "connect to unknown peer");
            if let Some(me) = hub.peers.get(&self.id) {
                let _ = me
                    .event_tx
                    .send(TransportEvent::Error {
                        message: format!("could not connect to {peer}: unknown peer"),
                    })
                    .await;
            }
            return;
        }

        if let Some(target) = hub.peers.get_mut(peer) {
            target.connections.insert(self.id.clone());
        }
        if let Some(me) = hub.peers.get_mut(&self.id) {
            me.connections.insert(peer.clone());
        }

        // Mirror the open to both ends.
        let target_tx = hub.peers.get(peer).map(|slot| slot.event_tx.clone());
        let my_tx = hub.peers.get(&self.id).map(|slot| slot.event_tx.clone());
        if let Some(tx) = target_tx {
            let _ = tx
                .send(TransportEvent::ConnectionOpened {
                    peer: self.id.clone(),
                })
                .await;
        }
        if let Some(tx) = my_tx {
            let _ = tx
                .send(TransportEvent::ConnectionOpened { peer: peer.clone() })
                .await;
        }
    }

    async fn call(&self, peer: &PeerId, stream: MediaStream) -> CallHandle {
        let hub = self.hub.lock().await;
        if !hub.peers.contains_key(&self.id) {
            return CallHandle::dead(peer.clone());
        }
        match hub.peers.get(peer) {
            Some(slot) => {
                // The receiver gets its own track objects.
                let call = IncomingCall::new(self.id.clone(), stream.fork());
                let _ = slot.event_tx.send(TransportEvent::CallReceived { call }).await;
                CallHandle::new(peer.clone())
            }
            None => {
                debug!(peer = %peer, "call to departed peer dropped");
                CallHandle::dead(peer.clone())
            }
        }
    }

    async fn close(&self) {
        let mut hub = self.hub.lock().await;
        let Some(slot) = hub.peers.remove(&self.id) else {
            return;
        };
        debug!(peer = %self.id, connections = slot.connections.len(), "endpoint closed");
        for peer in slot.connections {
            if let Some(other) = hub.peers.get_mut(&peer) {
                other.connections.remove(&self.id);
                let _ = other
                    .event_tx
                    .send(TransportEvent::ConnectionClosed {
                        peer: self.id.clone(),
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_common::{MediaTrack, TrackKind};

    async fn open_pair(
        transport: &MemoryTransport,
    ) -> (
        Box<dyn Endpoint>,
        mpsc::Receiver<TransportEvent>,
        Box<dyn Endpoint>,
        mpsc::Receiver<TransportEvent>,
    ) {
        let (a, a_rx) = transport.open().await.unwrap();
        let (b, b_rx) = transport.open().await.unwrap();
        (a, a_rx, b, b_rx)
    }

    #[tokio::test]
    async fn open_assigns_unique_identities() {
        let transport = MemoryTransport::new();
        let (a, _a_rx, b, _b_rx) = open_pair(&transport).await;
        assert_ne!(a.local_id(), b.local_id());
    }

    #[tokio::test]
    async fn connect_mirrors_open_to_both_ends() {
        let transport = MemoryTransport::new();
        let (a, mut a_rx, b, mut b_rx) = open_pair(&transport).await;

        a.connect(b.local_id()).await;

        match b_rx.recv().await.unwrap() {
            TransportEvent::ConnectionOpened { peer } => assert_eq!(&peer, a.local_id()),
            other => panic!("unexpected event: {other:?}"),
        }
        match a_rx.recv().await.unwrap() {
            TransportEvent::ConnectionOpened { peer } => assert_eq!(&peer, b.local_id()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_to_unknown_peer_reports_error() {
        let transport = MemoryTransport::new();
        let (a, mut a_rx) = transport.open().await.unwrap();

        a.connect(&PeerId::new("nobody")).await;

        match a_rx.recv().await.unwrap() {
            TransportEvent::Error { message } => assert!(message.contains("nobody")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_routes_a_forked_stream() {
        let transport = MemoryTransport::new();
        let (a, _a_rx, b, mut b_rx) = open_pair(&transport).await;

        let stream = MediaStream::new(vec![MediaTrack::new(TrackKind::Video)]);
        let handle = a.call(b.local_id(), stream.clone()).await;
        assert!(!handle.is_closed());

        let received = match b_rx.recv().await.unwrap() {
            TransportEvent::CallReceived { call } => {
                assert_eq!(call.caller(), a.local_id());
                call.answer()
            }
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(received.id(), stream.id());

        // Receiver-side stop must not halt the source tracks.
        received.stop_all();
        assert!(!stream.primary_track().unwrap().is_stopped());
    }

    #[tokio::test]
    async fn call_to_departed_peer_yields_dead_handle() {
        let transport = MemoryTransport::new();
        let (a, _a_rx, b, _b_rx) = open_pair(&transport).await;

        b.close().await;
        let stream = MediaStream::new(vec![MediaTrack::new(TrackKind::Video)]);
        let handle = a.call(b.local_id(), stream).await;
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn close_notifies_connected_peers_once() {
        let transport = MemoryTransport::new();
        let (a, mut a_rx, b, mut b_rx) = open_pair(&transport).await;

        a.connect(b.local_id()).await;
        let _ = a_rx.recv().await;
        let _ = b_rx.recv().await;

        b.close().await;
        b.close().await;

        match a_rx.recv().await.unwrap() {
            TransportEvent::ConnectionClosed { peer } => assert_eq!(&peer, b.local_id()),
            other => panic!("unexpected event: {other:?}"),
        }
        // Idempotent close: no further events queued for a.
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn per_peer_order_open_precedes_close() {
        let transport = MemoryTransport::new();
        let (a, _a_rx, b, mut b_rx) = open_pair(&transport).await;

        a.connect(b.local_id()).await;
        a.close().await;

        match b_rx.recv().await.unwrap() {
            TransportEvent::ConnectionOpened { peer } => assert_eq!(&peer, a.local_id()),
            other => panic!("unexpected event: {other:?}"),
        }
        match b_rx.recv().await.unwrap() {
            TransportEvent::ConnectionClosed { peer } => assert_eq!(&peer, a.local_id()),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
