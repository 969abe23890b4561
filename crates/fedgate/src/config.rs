//! Gateway configuration

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};

/// Tunables for a [`crate::FederatedGateway`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Capacity of the merged event channel. Producers block (while still
    /// observing cancellation) once this many events are unread.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    64
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.event_buffer == 0 {
            return Err(GatewayError::Config(
                "event_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
