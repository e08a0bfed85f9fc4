//! Media model shared by the capture and session layers.
//!
//! Streams are cheap clonable handles over shared tracks, so the host
//! controller and the per-viewer calls can hold the same capture without
//! copying frames. A track halts in one of two ways: the consumer calls
//! [`MediaTrack::stop`], or the source ends it out from under us (the user
//! revoking capture at the OS picker). Only the source-side end fires the
//! terminal signal watchers subscribe to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::identity::new_id;

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

/// Kind of media a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug)]
struct TrackShared {
    id: String,
    kind: TrackKind,
    stopped: AtomicBool,
    ended_tx: watch::Sender<bool>,
}

/// Handle to a single media track.
///
/// Clones share the underlying track; stopping or ending any handle is
/// visible through all of them.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    shared: Arc<TrackShared>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        let (ended_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(TrackShared {
                id: new_id(),
                kind,
                stopped: AtomicBool::new(false),
                ended_tx,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn kind(&self) -> TrackKind {
        self.shared.kind
    }

    /// Consumer-side halt. Idempotent, and does not fire the terminal
    /// signal: a track we stopped ourselves is not a revoked capture.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            debug!(track = %self.shared.id, kind = ?self.shared.kind, "track stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Source-side termination: the capture backing this track is gone.
    /// Fires the terminal signal exactly once; later calls are no-ops.
    pub fn end(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.ended_tx.send_if_modified(|ended| {
            if *ended {
                false
            } else {
                *ended = true;
                true
            }
        });
    }

    pub fn is_ended(&self) -> bool {
        *self.shared.ended_tx.borrow()
    }

    /// Subscribe to the terminal signal. The receiver observes `true` once
    /// the source ends the track, including when that already happened.
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.shared.ended_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

/// A bundle of tracks produced by one capture request.
///
/// Cloning yields another handle to the same tracks.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: new_id(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// The lead track, conventionally the one whose end signals that the
    /// whole capture is gone.
    pub fn primary_track(&self) -> Option<&MediaTrack> {
        self.tracks.first()
    }

    /// Stop every track. Idempotent.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Independent copy of this stream as a remote receiver would hold it:
    /// same stream id and track kinds, but fresh track objects that stop
    /// without touching the source tracks.
    pub fn fork(&self) -> MediaStream {
        Self {
            id: self.id.clone(),
            tracks: self
                .tracks
                .iter()
                .map(|track| MediaTrack::new(track.kind()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Failure to obtain capture media.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The user declined the capture prompt, or the platform blocked it.
    #[error("screen capture denied")]
    Denied,
}

/// Source of capturable media.
///
/// Implementations prompt the user (or fabricate media, for tests) and are
/// only invoked after the host explicitly accepts a share prompt.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn request_capture(&self, video: bool, audio: bool) -> Result<MediaStream, CaptureError>;
}

/// Capture source that fabricates tracks without touching any real screen.
/// Used by tests and the loopback demo.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticCapture;

#[async_trait]
impl MediaSource for SyntheticCapture {
    async fn request_capture(&self, video: bool, audio: bool) -> Result<MediaStream, CaptureError> {
        let mut tracks = Vec::new();
        if video {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }
        if audio {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if tracks.is_empty() {
            return Err(CaptureError::Denied);
        }
        let stream = MediaStream::new(tracks);
        debug!(stream = %stream.id(), tracks = stream.tracks().len(), "synthetic capture ready");
        Ok(stream)
    }
}
