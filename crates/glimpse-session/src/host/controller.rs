//! Background task driving the host state machine.
//!
//! Every input converges on one serialized loop: user commands, transport
//! events, and capture-end notifications are merged by `select!`, so no two
//! handlers ever run concurrently and per-peer event order is preserved end
//! to end. The loop suspends only at transport boundaries; a `stop()` issued
//! while registration is pending queues behind it and runs once it resolves.

use std::collections::HashMap;
use std::sync::Arc;

use glimpse_common::{MediaStream, PeerId};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

use super::types::{HostCommand, HostEvent, HostPhase};
use crate::registry::IdentityRegistry;
use crate::transport::{CallHandle, Transport, TransportEvent};
use crate::viewers::ViewerSet;

pub(super) async fn host_loop(
    transport: Arc<dyn Transport>,
    room: Arc<RwLock<Option<PeerId>>>,
    phase_tx: watch::Sender<HostPhase>,
    event_tx: mpsc::Sender<HostEvent>,
    mut command_rx: mpsc::Receiver<HostCommand>,
) {
    let _ = phase_tx.send(HostPhase::Registering);
    let (registry, mut transport_rx) = match IdentityRegistry::open(transport.as_ref()).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "host registration failed");
            let _ = phase_tx.send(HostPhase::Terminated);
            let _ = event_tx
                .send(HostEvent::RegistrationFailed {
                    reason: e.to_string(),
                })
                .await;
            return;
        }
    };

    let local = registry.local_id().clone();
    *room.write().await = Some(local.clone());
    info!(room = %local, "hosting session");
    let _ = phase_tx.send(HostPhase::Ready);
    let _ = event_tx.send(HostEvent::Registered { room: local }).await;

    // Capture watchers report back on their own queue so the public command
    // channel still closes when every handle is dropped.
    let (capture_tx, mut capture_rx) = mpsc::channel(4);

    let mut host = HostState {
        registry,
        room,
        viewers: ViewerSet::new(),
        active: None,
        calls: HashMap::new(),
        phase_tx,
        event_tx,
        capture_tx,
        prompt_raised: false,
        share_generation: 0,
    };

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(HostCommand::AcceptShare(stream)) => host.handle_accept_share(stream).await,
                Some(HostCommand::Stop) | None => {
                    host.shutdown().await;
                    break;
                }
            },
            event = transport_rx.recv() => match event {
                Some(event) => host.handle_transport_event(event).await,
                None => {
                    warn!("transport event stream ended");
                    host.shutdown().await;
                    break;
                }
            },
            Some(generation) = capture_rx.recv() => {
                host.handle_capture_ended(generation).await;
            }
        }
    }
}

struct HostState {
    registry: IdentityRegistry,
    room: Arc<RwLock<Option<PeerId>>>,
    viewers: ViewerSet,
    active: Option<MediaStream>,
    calls: HashMap<PeerId, CallHandle>,
    phase_tx: watch::Sender<HostPhase>,
    event_tx: mpsc::Sender<HostEvent>,
    capture_tx: mpsc::Sender<u64>,
    /// One prompt per awaiting period.
    prompt_raised: bool,
    /// Bumped per accepted share; stale capture watchers are discarded by it.
    share_generation: u64,
}

impl HostState {
    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionOpened { peer } => self.viewer_joined(peer).await,
            TransportEvent::ConnectionClosed { peer } => self.viewer_left(&peer).await,
            TransportEvent::CallReceived { call } => {
                // Hosts push media, they do not receive it.
                warn!(caller = %call.caller(), "ignoring inbound call to host");
            }
            TransportEvent::Error { message } => {
                warn!(error = %message, "transport error");
            }
        }
    }

    async fn viewer_joined(&mut self, peer: PeerId) {
        if !self.viewers.add(peer.clone()) {
            return;
        }
        info!(viewer = %peer, count = self.viewers.len(), "viewer connected");
        let _ = self
            .event_tx
            .send(HostEvent::ViewerCountChanged {
                count: self.viewers.len(),
            })
            .await;

        if let Some(stream) = self.active.clone() {
            // Late joiner catches the live stream, no new prompt.
            let handle = self.registry.call(&peer, stream).await;
            self.calls.insert(peer, handle);
        } else {
            self.set_phase(HostPhase::AwaitingShare);
            if !self.prompt_raised {
                self.prompt_raised = true;
                let _ = self.event_tx.send(HostEvent::SharePromptRaised).await;
            }
        }
    }

    async fn viewer_left(&mut self, peer: &PeerId) {
        if !self.viewers.remove(peer) {
            return;
        }
        if let Some(handle) = self.calls.remove(peer) {
            handle.close();
        }
        info!(viewer = %peer, count = self.viewers.len(), "viewer disconnected");
        let _ = self
            .event_tx
            .send(HostEvent::ViewerCountChanged {
                count: self.viewers.len(),
            })
            .await;

        if self.active.is_none() && self.viewers.is_empty() {
            // Room emptied before sharing started; withdraw the prompt so
            // the next joiner raises a fresh one.
            self.prompt_raised = false;
            self.set_phase(HostPhase::Ready);
        }
    }

    async fn handle_accept_share(&mut self, stream: MediaStream) {
        if self.active.is_some() || self.viewers.is_empty() {
            warn!(stream = %stream.id(), "no share pending; stopping stray capture");
            stream.stop_all();
            return;
        }

        self.share_generation += 1;
        self.spawn_capture_watcher(&stream);

        info!(stream = %stream.id(), viewers = self.viewers.len(), "sharing started");
        self.set_phase(HostPhase::Sharing);
        self.prompt_raised = false;
        let _ = self.event_tx.send(HostEvent::SharingStarted).await;

        self.active = Some(stream.clone());
        for peer in self.viewers.snapshot() {
            let handle = self.registry.call(&peer, stream.clone()).await;
            self.calls.insert(peer, handle);
        }
    }

    /// Watch the stream's primary track and report back when the source
    /// ends it, tagged with the share generation that owns the watcher.
    fn spawn_capture_watcher(&self, stream: &MediaStream) {
        let Some(track) = stream.primary_track() else {
            warn!(stream = %stream.id(), "stream has no tracks, capture end will not be observed");
            return;
        };
        let mut ended = track.ended();
        let capture_tx = self.capture_tx.clone();
        let generation = self.share_generation;
        tokio::spawn(async move {
            if ended.wait_for(|ended| *ended).await.is_ok() {
                let _ = capture_tx.send(generation).await;
            }
        });
    }

    async fn handle_capture_ended(&mut self, generation: u64) {
        if generation != self.share_generation {
            return; // watcher from an earlier share
        }
        let Some(stream) = self.active.take() else {
            return;
        };
        info!(stream = %stream.id(), "capture ended at the source");
        self.close_calls();
        stream.stop_all();
        let _ = self.event_tx.send(HostEvent::CaptureEnded).await;

        if self.viewers.is_empty() {
            self.set_phase(HostPhase::Ready);
        } else {
            // Viewers are still waiting; restarting takes a fresh accept.
            self.set_phase(HostPhase::AwaitingShare);
            self.prompt_raised = true;
            let _ = self.event_tx.send(HostEvent::SharePromptRaised).await;
        }
    }

    async fn shutdown(&mut self) {
        if let Some(stream) = self.active.take() {
            stream.stop_all();
        }
        self.close_calls();
        self.registry.close().await;
        self.viewers.clear();
        *self.room.write().await = None;
        info!(room = %self.registry.local_id(), "session ended");
        self.set_phase(HostPhase::Terminated);
        let _ = self.event_tx.send(HostEvent::SessionEnded).await;
    }

    fn close_calls(&mut self) {
        for (_, handle) in self.calls.drain() {
            handle.close();
        }
    }

    fn set_phase(&self, phase: HostPhase) {
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
