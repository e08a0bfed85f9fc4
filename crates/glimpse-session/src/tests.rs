//! End-to-end scenarios wiring host and viewer controllers over the
//! in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glimpse_common::{
    CaptureError, MediaSource, MediaStream, MediaTrack, PeerId, SessionConfig, SyntheticCapture,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::host::{HostEvent, HostPhase, HostSession};
use crate::transport::MemoryTransport;
use crate::viewer::{ViewerEvent, ViewerPhase, ViewerSession};

struct DenyingCapture;

#[async_trait]
impl MediaSource for DenyingCapture {
    async fn request_capture(
        &self,
        _video: bool,
        _audio: bool,
    ) -> Result<MediaStream, CaptureError> {
        Err(CaptureError::Denied)
    }
}

async fn next_host_event(rx: &mut mpsc::Receiver<HostEvent>) -> HostEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for host event")
        .expect("host event channel closed")
}

async fn next_viewer_event(rx: &mut mpsc::Receiver<ViewerEvent>) -> ViewerEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for viewer event")
        .expect("viewer event channel closed")
}

async fn start_host(
    transport: &MemoryTransport,
) -> (HostSession, mpsc::Receiver<HostEvent>, PeerId) {
    let (session, mut events) =
        HostSession::start(Arc::new(transport.clone()), SessionConfig::default());
    let room = match next_host_event(&mut events).await {
        HostEvent::Registered { room } => room,
        other => panic!("expected registration, got {other:?}"),
    };
    (session, events, room)
}

/// Join the room and wait until the signaling connection is up.
async fn join(
    transport: &MemoryTransport,
    room: &PeerId,
) -> (ViewerSession, mpsc::Receiver<ViewerEvent>) {
    let (session, mut events) = ViewerSession::join(
        Arc::new(transport.clone()),
        room.as_str(),
        SessionConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        next_viewer_event(&mut events).await,
        ViewerEvent::Connected
    ));
    (session, events)
}

async fn expect_stream(rx: &mut mpsc::Receiver<ViewerEvent>) -> MediaStream {
    match next_viewer_event(rx).await {
        ViewerEvent::StreamReady { stream } => stream,
        other => panic!("expected stream, got {other:?}"),
    }
}

#[tokio::test]
async fn full_session_lifecycle() {
    let transport = MemoryTransport::new();
    let (host, mut host_events, room) = start_host(&transport).await;

    let (viewer, mut viewer_events) = join(&transport, &room).await;
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::ViewerCountChanged { count: 1 }
    ));
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SharePromptRaised
    ));
    assert_eq!(host.phase(), HostPhase::AwaitingShare);

    let capture = SyntheticCapture.request_capture(true, true).await.unwrap();
    host.accept_share(capture.clone()).await;
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SharingStarted
    ));

    let received = expect_stream(&mut viewer_events).await;
    assert_eq!(received.id(), capture.id());
    assert_eq!(viewer.phase(), ViewerPhase::Streaming);
    assert_eq!(host.phase(), HostPhase::Sharing);
}

#[tokio::test]
async fn leaver_does_not_disturb_other_viewers() {
    let transport = MemoryTransport::new();
    let (host, mut host_events, room) = start_host(&transport).await;

    let (_v1, mut v1_events) = join(&transport, &room).await;
    let (v2, mut v2_events) = join(&transport, &room).await;
    for _ in 0..3 {
        let _ = next_host_event(&mut host_events).await; // count, prompt, count
    }

    let capture = SyntheticCapture.request_capture(true, false).await.unwrap();
    host.accept_share(capture).await;
    let _ = next_host_event(&mut host_events).await; // sharing started
    let v1_stream = expect_stream(&mut v1_events).await;
    let _ = expect_stream(&mut v2_events).await;

    v2.leave().await;
    assert!(matches!(
        next_viewer_event(&mut v2_events).await,
        ViewerEvent::SessionEnded
    ));
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::ViewerCountChanged { count: 1 }
    ));

    assert_eq!(host.phase(), HostPhase::Sharing);
    assert!(v1_stream.tracks().iter().all(|t| !t.is_stopped()));
}

#[tokio::test]
async fn host_stop_disconnects_every_viewer() {
    let transport = MemoryTransport::new();
    let (host, mut host_events, room) = start_host(&transport).await;

    let (v1, mut v1_events) = join(&transport, &room).await;
    let (v2, mut v2_events) = join(&transport, &room).await;
    for _ in 0..3 {
        let _ = next_host_event(&mut host_events).await;
    }

    let capture = SyntheticCapture.request_capture(true, true).await.unwrap();
    host.accept_share(capture.clone()).await;
    let _ = next_host_event(&mut host_events).await;
    let v1_stream = expect_stream(&mut v1_events).await;
    let v2_stream = expect_stream(&mut v2_events).await;

    host.stop().await;
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SessionEnded
    ));
    assert!(matches!(
        next_viewer_event(&mut v1_events).await,
        ViewerEvent::SessionEnded
    ));
    assert!(matches!(
        next_viewer_event(&mut v2_events).await,
        ViewerEvent::SessionEnded
    ));

    assert_eq!(host.phase(), HostPhase::Terminated);
    assert_eq!(v1.phase(), ViewerPhase::Disconnected);
    assert_eq!(v2.phase(), ViewerPhase::Disconnected);
    assert!(capture.tracks().iter().all(MediaTrack::is_stopped));
    assert!(v1_stream.tracks().iter().all(MediaTrack::is_stopped));
    assert!(v2_stream.tracks().iter().all(MediaTrack::is_stopped));
}

#[tokio::test]
async fn capture_denial_leaves_the_prompt_actionable() {
    let transport = MemoryTransport::new();
    let (host, mut host_events, room) = start_host(&transport).await;

    let (_viewer, mut viewer_events) = join(&transport, &room).await;
    let _ = next_host_event(&mut host_events).await; // count
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SharePromptRaised
    ));

    // The user declines the capture picker; nothing reaches the controller
    // and the prompt stays pending.
    let denied = DenyingCapture.request_capture(true, true).await;
    assert!(matches!(denied, Err(CaptureError::Denied)));
    assert_eq!(host.phase(), HostPhase::AwaitingShare);

    // Acting on the prompt again succeeds.
    let capture = SyntheticCapture.request_capture(true, true).await.unwrap();
    host.accept_share(capture.clone()).await;
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SharingStarted
    ));
    let received = expect_stream(&mut viewer_events).await;
    assert_eq!(received.id(), capture.id());
}

#[tokio::test]
async fn dropping_the_host_handle_ends_the_session_for_viewers() {
    let transport = MemoryTransport::new();
    let (host, mut host_events, room) = start_host(&transport).await;

    let (_viewer, mut viewer_events) = join(&transport, &room).await;
    let _ = next_host_event(&mut host_events).await;
    let _ = next_host_event(&mut host_events).await;

    drop(host);
    assert!(matches!(
        next_host_event(&mut host_events).await,
        HostEvent::SessionEnded
    ));
    assert!(matches!(
        next_viewer_event(&mut viewer_events).await,
        ViewerEvent::SessionEnded
    ));
}
