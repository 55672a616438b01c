//! Score arbitration for client-reported explosions
//!
//! The server never detects hits itself. A connection reports that its own
//! ship exploded; the arbiter credits the opposing team and announces both
//! the loser and the new tally to every session.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::{BroadcastRouter, EntityRegistry, Team};

/// Kill count per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    pub red: u32,
    pub blue: u32,
}

impl ScoreTally {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    fn credit(&mut self, team: Team) {
        let slot = match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Process-wide tally plus the explosion handling that mutates it
#[derive(Debug, Default)]
pub struct Scoreboard {
    tally: Mutex<ScoreTally>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tally
    pub fn tally(&self) -> ScoreTally {
        *self.tally.lock()
    }

    /// Run `f` with the current tally while no explosion can be scored
    pub fn with_tally<R>(&self, f: impl FnOnce(ScoreTally) -> R) -> R {
        let tally = self.tally.lock();
        f(*tally)
    }

    /// Handle an explosion report from `connection_id`'s own connection.
    ///
    /// Returns the updated tally, or `None` when the reporter is no longer
    /// registered. The announcement and the score update are fanned out
    /// while the tally lock is held, so every recipient sees tallies in
    /// non-decreasing order.
    pub fn report_explosion(
        &self,
        connection_id: Uuid,
        registry: &EntityRegistry,
        router: &BroadcastRouter,
    ) -> Option<ScoreTally> {
        let victim = registry.get_player(connection_id)?;
        let credited = victim.team.opponent();

        let mut tally = self.tally.lock();
        tally.credit(credited);
        let snapshot = *tally;

        router.broadcast_all(&ServerMsg::ExplosionAnnounced { connection_id });
        router.broadcast_all(&ServerMsg::score_update(snapshot));
        drop(tally);

        info!(
            connection_id = %connection_id,
            victim_team = ?victim.team,
            credited_team = ?credited,
            red = snapshot.red,
            blue = snapshot.blue,
            "Ship exploded"
        );

        Some(snapshot)
    }
}
