//! Team assignment and spawn placement

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::Pose;

/// Arena width in world units
pub const ARENA_WIDTH: f32 = 800.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f32 = 600.0;

/// Horizontal spawn range, shared by both teams
const SPAWN_X: std::ops::Range<f32> = 50.0..750.0;

/// The two sides of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Spawns along the top, facing down the field
    Red,
    /// Spawns along the bottom, facing up the field
    Blue,
}

impl Team {
    /// The team credited when a ship of this team explodes
    pub fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// Vertical spawn band for this team
    fn spawn_band(self) -> std::ops::Range<f32> {
        match self {
            Self::Red => 50.0..150.0,
            Self::Blue => 400.0..500.0,
        }
    }

    /// Initial facing, so the teams start pointed at each other
    pub fn spawn_rotation(self) -> f32 {
        match self {
            Self::Red => 0.0,
            Self::Blue => std::f32::consts::PI,
        }
    }
}

/// Alternates teams across new connections and picks spawn poses.
///
/// The toggle flips once per assignment and is never rewound on disconnect,
/// so balance is best-effort.
pub struct TeamAssigner {
    next_is_red: AtomicBool,
    rng: Mutex<ChaCha8Rng>,
}

impl TeamAssigner {
    /// The first assignment is always `Team::Red`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            next_is_red: AtomicBool::new(true),
            rng: Mutex::new(rng),
        }
    }

    /// Flip the toggle and return the team for the connection that flipped it
    pub fn next_team(&self) -> Team {
        if self.next_is_red.fetch_xor(true, Ordering::AcqRel) {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// Random position inside the team's band, facing the opposing side
    pub fn spawn_pose(&self, team: Team) -> Pose {
        let mut rng = self.rng.lock();
        Pose {
            x: rng.gen_range(SPAWN_X),
            y: rng.gen_range(team.spawn_band()),
            rotation: team.spawn_rotation(),
        }
    }

    /// Assign a team and a spawn pose in one step
    pub fn assign(&self) -> (Team, Pose) {
        let team = self.next_team();
        (team, self.spawn_pose(team))
    }
}

impl Default for TeamAssigner {
    fn default() -> Self {
        Self::new(None)
    }
}
