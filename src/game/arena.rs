//! Shared arena state handed to every session

use parking_lot::Mutex;

use super::{BroadcastRouter, EntityRegistry, Scoreboard, TeamAssigner};

/// Everything sessions share: entity records, team toggle, scores and the
/// broadcast router. Owned by `AppState` and passed in explicitly.
pub struct Arena {
    pub registry: EntityRegistry,
    pub teams: TeamAssigner,
    pub scores: Scoreboard,
    pub router: BroadcastRouter,
    /// Serializes joins and leaves against each other so a newcomer's
    /// snapshot matches the membership it is announced into
    pub(crate) membership: Mutex<()>,
}

impl Arena {
    pub fn new(outbound_buffer: usize, spawn_seed: Option<u64>) -> Self {
        Self {
            registry: EntityRegistry::new(),
            teams: TeamAssigner::new(spawn_seed),
            scores: Scoreboard::new(),
            router: BroadcastRouter::new(outbound_buffer),
            membership: Mutex::new(()),
        }
    }

    /// Live sessions
    pub fn connection_count(&self) -> usize {
        self.router.len()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(256, None)
    }
}
