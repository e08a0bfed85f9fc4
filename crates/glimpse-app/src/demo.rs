//! Loopback demo.
//!
//! Runs a host and a handful of viewers against the in-memory transport and
//! walks the whole session arc: register, join, prompt, share, one viewer
//! leaves, host stops. Every event is rendered through the console presenter.

use std::sync::Arc;

use glimpse_common::{CaptureError, MediaSource, MediaStream, SyntheticCapture};
use glimpse_session::{
    HostEvent, HostSession, MemoryTransport, SessionError, ViewerEvent, ViewerSession,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::presenter::ConsolePresenter;
use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("event stream ended unexpectedly")]
    EventStreamEnded,
}

/// Capture source that always declines, standing in for a user hitting
/// "cancel" on the share picker.
struct DenyingCapture;

#[async_trait::async_trait]
impl MediaSource for DenyingCapture {
    async fn request_capture(
        &self,
        _video: bool,
        _audio: bool,
    ) -> Result<MediaStream, CaptureError> {
        Err(CaptureError::Denied)
    }
}

pub async fn run(settings: Settings, viewers: usize, deny_capture: bool) -> Result<(), DemoError> {
    // A promptless demo has nothing to show.
    let viewers = viewers.max(1);

    let mut presenter = ConsolePresenter::new(settings.base_url.clone());
    let transport = Arc::new(MemoryTransport::new());

    let (host, mut host_events) = HostSession::start(transport.clone(), settings.session.clone());
    let room = loop {
        match next_host(&mut host_events, &mut presenter).await? {
            HostEvent::Registered { room } => break room,
            HostEvent::RegistrationFailed { reason } => {
                return Err(SessionError::RegistrationFailed(reason).into());
            }
            _ => {}
        }
    };

    let mut sessions = Vec::with_capacity(viewers);
    for index in 0..viewers {
        let label = format!("viewer-{}", index + 1);
        let (viewer, mut events) =
            ViewerSession::join(transport.clone(), room.as_str(), settings.session.clone())?;
        wait_viewer(&mut events, &presenter, &label, |event| {
            matches!(event, ViewerEvent::Connected)
        })
        .await?;
        sessions.push((label, viewer, events));
    }

    wait_host(&mut host_events, &mut presenter, |event| {
        matches!(event, HostEvent::SharePromptRaised)
    })
    .await?;

    let capture = settings.session.capture;
    if deny_capture {
        // First answer: decline. The prompt stays pending and a later accept
        // still goes through.
        if let Err(err) = DenyingCapture.request_capture(capture.video, capture.audio).await {
            warn!(error = %err, "capture declined, the share prompt stays pending");
        }
    }

    let stream = SyntheticCapture
        .request_capture(capture.video, capture.audio)
        .await?;
    host.accept_share(stream).await;
    wait_host(&mut host_events, &mut presenter, |event| {
        matches!(event, HostEvent::SharingStarted)
    })
    .await?;
    for (label, _viewer, events) in sessions.iter_mut() {
        wait_viewer(events, &presenter, label, |event| {
            matches!(event, ViewerEvent::StreamReady { .. })
        })
        .await?;
    }

    // One viewer walks away mid-share. The rest keep watching.
    if let Some((label, viewer, mut events)) = sessions.pop() {
        viewer.leave().await;
        wait_viewer(&mut events, &presenter, &label, |event| {
            matches!(event, ViewerEvent::SessionEnded)
        })
        .await?;
        if !sessions.is_empty() {
            wait_host(&mut host_events, &mut presenter, |event| {
                matches!(event, HostEvent::ViewerCountChanged { .. })
            })
            .await?;
        }
    }

    // The host ends the session for everyone still attached.
    host.stop().await;
    wait_host(&mut host_events, &mut presenter, |event| {
        matches!(event, HostEvent::SessionEnded)
    })
    .await?;
    for (label, _viewer, events) in sessions.iter_mut() {
        wait_viewer(events, &presenter, label, |event| {
            matches!(event, ViewerEvent::SessionEnded)
        })
        .await?;
    }

    info!("demo complete");
    Ok(())
}

async fn next_host(
    events: &mut mpsc::Receiver<HostEvent>,
    presenter: &mut ConsolePresenter,
) -> Result<HostEvent, DemoError> {
    let Some(event) = events.recv().await else {
        return Err(DemoError::EventStreamEnded);
    };
    presenter.host_event(&event);
    Ok(event)
}

async fn wait_host(
    events: &mut mpsc::Receiver<HostEvent>,
    presenter: &mut ConsolePresenter,
    want: impl Fn(&HostEvent) -> bool,
) -> Result<(), DemoError> {
    loop {
        if want(&next_host(events, presenter).await?) {
            return Ok(());
        }
    }
}

async fn wait_viewer(
    events: &mut mpsc::Receiver<ViewerEvent>,
    presenter: &ConsolePresenter,
    viewer: &str,
    want: impl Fn(&ViewerEvent) -> bool,
) -> Result<(), DemoError> {
    loop {
        let Some(event) = events.recv().await else {
            return Err(DemoError::EventStreamEnded);
        };
        presenter.viewer_event(viewer, &event);
        if want(&event) {
            return Ok(());
        }
        if let ViewerEvent::ConnectionFailed { reason } = event {
            return Err(SessionError::ConnectionFailed(reason).into());
        }
    }
}
