//! Background task driving the viewer state machine.

use std::sync::Arc;

use glimpse_common::{MediaStream, PeerId};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::types::{ViewerCommand, ViewerEvent, ViewerPhase};
use crate::registry::IdentityRegistry;
use crate::transport::{Transport, TransportEvent};

pub(super) async fn viewer_loop(
    transport: Arc<dyn Transport>,
    room: PeerId,
    phase_tx: watch::Sender<ViewerPhase>,
    event_tx: mpsc::Sender<ViewerEvent>,
    mut command_rx: mpsc::Receiver<ViewerCommand>,
) {
    let _ = phase_tx.send(ViewerPhase::Connecting);
    let (registry, mut transport_rx) = match IdentityRegistry::open(transport.as_ref()).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(room = %room, error = %e, "viewer registration failed");
            let _ = phase_tx.send(ViewerPhase::Disconnected);
            let _ = event_tx
                .send(ViewerEvent::ConnectionFailed {
                    reason: e.to_string(),
                })
                .await;
            return;
        }
    };

    info!(room = %room, viewer = %registry.local_id(), "joining room");
    registry.connect(&room).await;

    let mut viewer = ViewerState {
        registry,
        room,
        stream: None,
        phase_tx,
        event_tx,
    };

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(ViewerCommand::Leave) | None => {
                    viewer.shutdown().await;
                    break;
                }
            },
            event = transport_rx.recv() => match event {
                Some(event) => {
                    if viewer.handle_transport_event(event).await {
                        break;
                    }
                }
                None => {
                    viewer.shutdown().await;
                    break;
                }
            },
        }
    }
}

struct ViewerState {
    registry: IdentityRegistry,
    room: PeerId,
    stream: Option<MediaStream>,
    phase_tx: watch::Sender<ViewerPhase>,
    event_tx: mpsc::Sender<ViewerEvent>,
}

impl ViewerState {
    /// Returns true when the attempt is over and the loop should exit.
    async fn handle_transport_event(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::ConnectionOpened { peer } => {
                if peer == self.room {
                    info!(room = %self.room, "connected, waiting for the host to share");
                    self.set_phase(ViewerPhase::Connected);
                    let _ = self.event_tx.send(ViewerEvent::Connected).await;
                }
                false
            }
            TransportEvent::CallReceived { call } => {
                // A viewer is only ever attached to one room, so any inbound
                // call is the host's stream. Answer unconditionally.
                debug!(caller = %call.caller(), "answering inbound call");
                let stream = call.answer();
                if let Some(old) = self.stream.replace(stream.clone()) {
                    old.stop_all();
                }
                self.set_phase(ViewerPhase::Streaming);
                let _ = self.event_tx.send(ViewerEvent::StreamReady { stream }).await;
                false
            }
            TransportEvent::ConnectionClosed { peer } => {
                if peer != self.room {
                    return false;
                }
                info!(room = %self.room, "host closed the session");
                self.shutdown().await;
                true
            }
            TransportEvent::Error { message } => {
                if self.phase() == ViewerPhase::Streaming {
                    // Media already arrived; treat transport failure as the
                    // end of the session.
                    warn!(room = %self.room, error = %message, "transport failed mid-stream");
                    self.shutdown().await;
                } else {
                    warn!(room = %self.room, error = %message, "could not reach room");
                    self.fail(message).await;
                }
                true
            }
        }
    }

    /// Scoped release plus the normal-termination report.
    async fn shutdown(&mut self) {
        self.release().await;
        self.set_phase(ViewerPhase::Disconnected);
        let _ = self.event_tx.send(ViewerEvent::SessionEnded).await;
    }

    /// Scoped release plus the failure report.
    async fn fail(&mut self, reason: String) {
        self.release().await;
        self.set_phase(ViewerPhase::Disconnected);
        let _ = self
            .event_tx
            .send(ViewerEvent::ConnectionFailed { reason })
            .await;
    }

    async fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_all();
        }
        self.registry.close().await;
    }

    fn phase(&self) -> ViewerPhase {
        *self.phase_tx.borrow()
    }

    fn set_phase(&self, phase: ViewerPhase) {
        self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        });
    }
}
