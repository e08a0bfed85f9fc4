//! Session configuration types.

use serde::{Deserialize, Serialize};

/// Tuning for a session controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of the controller's serialized command queue.
    pub command_buffer: usize,
    /// Capacity of the controller's outbound event channel.
    pub event_buffer: usize,
    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            event_buffer: 256,
            capture: CaptureConfig::default(),
        }
    }
}

/// What the host requests from its capture source when it accepts a share
/// prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub video: bool,
    pub audio: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}
