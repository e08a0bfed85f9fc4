//! Session orchestration for one-to-many screen sharing over peer-to-peer
//! transport.
//!
//! A host registers an identity that doubles as the room code, viewers dial
//! it, and once the host accepts the share prompt its capture stream is
//! pushed to every attached viewer. Controllers are cheap handles over
//! serialized background loops; all mutable state lives inside the loop
//! task, so handlers never run concurrently.

pub mod error;
pub mod host;
pub mod registry;
pub mod transport;
pub mod viewer;
pub mod viewers;

#[cfg(test)]
mod tests;

pub use error::SessionError;
pub use host::{HostEvent, HostPhase, HostSession};
pub use registry::IdentityRegistry;
pub use transport::{
    CallHandle, Endpoint, IncomingCall, MemoryTransport, Transport, TransportError, TransportEvent,
};
pub use viewer::{ViewerEvent, ViewerPhase, ViewerSession};
pub use viewers::ViewerSet;
