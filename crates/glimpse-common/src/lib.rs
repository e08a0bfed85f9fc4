pub mod config;
pub mod identity;
pub mod media;

pub use config::{CaptureConfig, SessionConfig};
pub use identity::{join_link, new_id, PeerId};
pub use media::{CaptureError, MediaSource, MediaStream, MediaTrack, SyntheticCapture, TrackKind};
