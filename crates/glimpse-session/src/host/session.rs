//! Public handle for a hosted sharing session.

use std::sync::Arc;

use glimpse_common::{MediaStream, PeerId, SessionConfig};
use tokio::sync::{mpsc, watch, RwLock};

use super::controller::host_loop;
use super::types::{HostCommand, HostEvent, HostPhase};
use crate::transport::Transport;

/// Handle for a hosted session.
///
/// All methods are non-blocking sends onto the session's serialized command
/// queue. Dropping every handle closes the queue, which tears the session
/// down the same way [`HostSession::stop`] does.
#[derive(Clone)]
pub struct HostSession {
    command_tx: mpsc::Sender<HostCommand>,
    phase_rx: watch::Receiver<HostPhase>,
    room: Arc<RwLock<Option<PeerId>>>,
}

impl HostSession {
    /// Start hosting: register an identity and wait for viewers.
    /// Returns `(session, event_receiver)`.
    pub fn start(
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<HostEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (phase_tx, phase_rx) = watch::channel(HostPhase::Idle);
        let room = Arc::new(RwLock::new(None));

        tokio::spawn(host_loop(
            transport,
            Arc::clone(&room),
            phase_tx,
            event_tx,
            command_rx,
        ));

        (
            Self {
                command_tx,
                phase_rx,
                room,
            },
            event_rx,
        )
    }

    /// Push a freshly captured stream to every attached viewer.
    ///
    /// Only honored while viewers are waiting and nothing is shared yet;
    /// otherwise the stray stream's tracks are stopped and the command is
    /// dropped with a warning.
    pub async fn accept_share(&self, stream: MediaStream) {
        if let Err(rejected) = self.command_tx.send(HostCommand::AcceptShare(stream)).await {
            // Session already torn down; release the capture.
            if let HostCommand::AcceptShare(stream) = rejected.0 {
                stream.stop_all();
            }
        }
    }

    /// End the session. Idempotent, and safe from any state, including
    /// before registration completes.
    pub async fn stop(&self) {
        let _ = self.command_tx.send(HostCommand::Stop).await;
    }

    /// The room code viewers dial, once registration completed.
    pub async fn room(&self) -> Option<PeerId> {
        self.room.read().await.clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> HostPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<HostPhase> {
        self.phase_rx.clone()
    }
}
