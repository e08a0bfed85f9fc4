//! Set of peers attached to a hosted room.

use glimpse_common::PeerId;

/// Ordered set of attached viewers, insertion order = join order.
///
/// Only the host controller loop mutates it, so serialization comes from the
/// loop's single queue rather than a lock. Fan-out decisions iterate over
/// [`ViewerSet::snapshot`], never the live set.
#[derive(Debug, Default)]
pub struct ViewerSet {
    peers: Vec<PeerId>,
}

impl ViewerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer. Returns false if it was already present.
    pub fn add(&mut self, peer: PeerId) -> bool {
        if self.contains(&peer) {
            return false;
        }
        self.peers.push(peer);
        true
    }

    /// Remove a peer. Returns false if it was not present.
    pub fn remove(&mut self, peer: &PeerId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| p != peer);
        self.peers.len() != before
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.iter().any(|p| p == peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    /// Frozen copy for iteration.
    pub fn snapshot(&self) -> Vec<PeerId> {
        self.peers.clone()
    }
}
