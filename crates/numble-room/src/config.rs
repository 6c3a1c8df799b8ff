//! Room-layer settings.

use std::time::Duration;

/// Settings shared by every room a [`RoomRegistry`](crate::RoomRegistry)
/// creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// How long a room lives after creation, whatever its state.
    pub ttl: Duration,

    /// How often the reaper sweeps expired rooms out of the registry.
    pub sweep_interval: Duration,

    /// Capacity of each room actor's command channel. Callers wait when it
    /// is full.
    pub channel_size: usize,

    /// How many fresh codes to try before giving up on a create.
    pub max_code_attempts: usize,

    /// Forfeit a player's turn when a Speed room's per-turn time runs out.
    /// Off: the time limit is advisory and only reported to clients.
    pub enforce_turn_timer: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60),
            channel_size: 64,
            max_code_attempts: 16,
            enforce_turn_timer: false,
        }
    }
}
