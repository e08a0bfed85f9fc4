//! Public handle for a viewer's attachment to a room.

use std::sync::Arc;

use glimpse_common::{PeerId, SessionConfig};
use tokio::sync::{mpsc, watch};

use super::controller::viewer_loop;
use super::types::{ViewerCommand, ViewerEvent, ViewerPhase};
use crate::error::SessionError;
use crate::transport::Transport;

/// Handle for a viewer session.
///
/// Dropping every handle closes the command queue, which releases the
/// attachment the same way [`ViewerSession::leave`] does.
#[derive(Clone)]
pub struct ViewerSession {
    command_tx: mpsc::Sender<ViewerCommand>,
    phase_rx: watch::Receiver<ViewerPhase>,
}

impl ViewerSession {
    /// Join the room at `code`. Returns `(session, event_receiver)`.
    ///
    /// A blank code is rejected here, before any transport contact; every
    /// later failure is reported on the event stream.
    pub fn join(
        transport: Arc<dyn Transport>,
        code: &str,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<ViewerEvent>), SessionError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SessionError::InvalidRoomCode);
        }
        let room = PeerId::new(code);

        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (phase_tx, phase_rx) = watch::channel(ViewerPhase::Idle);

        tokio::spawn(viewer_loop(transport, room, phase_tx, event_tx, command_rx));

        Ok((
            Self {
                command_tx,
                phase_rx,
            },
            event_rx,
        ))
    }

    /// Detach from the room. Idempotent; always stops held tracks and
    /// releases the identity, whatever state the attempt is in.
    pub async fn leave(&self) {
        let _ = self.command_tx.send(ViewerCommand::Leave).await;
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ViewerPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<ViewerPhase> {
        self.phase_rx.clone()
    }
}
