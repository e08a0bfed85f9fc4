//! Viewer-side session controller: dials a room, answers the host's call,
//! and watches for the session to end.

mod controller;
mod session;
mod types;


pub use session::ViewerSession;
pub use types::{ViewerEvent, ViewerPhase};
