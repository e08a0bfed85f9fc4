//! Console rendering of session events.

use glimpse_common::join_link;
use glimpse_session::{HostEvent, ViewerEvent};
use tracing::{error, info, warn};

/// Turns controller events into the console lines a user sees.
pub struct ConsolePresenter {
    base_url: String,
    viewer_count: usize,
}

impl ConsolePresenter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            viewer_count: 0,
        }
    }

    pub fn host_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::Registered { room } => {
                info!(room = %room, "session created");
                info!("share this link: {}", join_link(&self.base_url, room));
            }
            HostEvent::RegistrationFailed { reason } => {
                error!(reason = %reason, "could not create the session");
            }
            HostEvent::ViewerCountChanged { count } => {
                if *count > self.viewer_count {
                    info!(viewers = count, "new viewer connected");
                } else {
                    info!(viewers = count, "a viewer left");
                }
                self.viewer_count = *count;
            }
            HostEvent::SharePromptRaised => {
                info!("someone wants to view your screen, start sharing?");
            }
            HostEvent::SharingStarted => {
                info!("screen sharing started");
            }
            HostEvent::CaptureEnded => {
                warn!("screen capture ended");
            }
            HostEvent::SessionEnded => {
                info!("the session has been ended");
            }
        }
    }

    pub fn viewer_event(&self, viewer: &str, event: &ViewerEvent) {
        match event {
            ViewerEvent::Connected => {
                info!(viewer, "connected, waiting for the host to share their screen");
            }
            ViewerEvent::StreamReady { stream } => {
                info!(
                    viewer,
                    stream = %stream.id(),
                    tracks = stream.tracks().len(),
                    "receiving the host's screen"
                );
            }
            ViewerEvent::ConnectionFailed { reason } => {
                warn!(viewer, reason = %reason, "could not join the session");
            }
            ViewerEvent::SessionEnded => {
                info!(viewer, "the session has been ended");
            }
        }
    }
}
