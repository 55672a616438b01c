//! Application state shared across routes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::game::Arena;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: Arc<Arena>,
    /// WebSocket slots reserved by upgrades in progress or live sessions
    pub ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let arena = Arc::new(Arena::new(config.outbound_buffer, config.spawn_seed));

        Self {
            config: Arc::new(config),
            arena,
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// One reserved WebSocket slot, released on drop
#[derive(Debug)]
pub struct ConnectionSlot {
    live: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    /// Reserve a slot if fewer than `max` are taken
    pub fn try_acquire(live: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        live.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            (n < max).then_some(n + 1)
        })
        .ok()?;

        Some(Self {
            live: Arc::clone(live),
        })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}
