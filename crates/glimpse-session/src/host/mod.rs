//! Host-side session controller: owns the room identity, tracks attached
//! viewers, and fans the capture stream out to each of them.

mod controller;
mod session;
mod types;


pub use session::HostSession;
pub use types::{HostEvent, HostPhase};
