//! Entity registry - authoritative player and projectile records
//!
//! Records live in sharded concurrent maps. Every write replaces a whole
//! record (or a whole `Pose`) while the shard lock is held, so a reader
//! serializing a broadcast never sees half of a movement update.

use dashmap::DashMap;
use tracing::warn;
use uuid::Uuid;

use super::Team;

/// Client-assigned projectile number. Only unique per owning connection.
pub type ProjectileId = u64;

/// Position and facing reported by a client
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians
    pub rotation: f32,
}

/// Authoritative player record, one per live connection
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub connection_id: Uuid,
    pub team: Team,
    pub pose: Pose,
}

/// In-flight projectile, addressed by `(owner_id, projectile_id)`
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner_id: Uuid,
    pub projectile_id: ProjectileId,
    pub pose: Pose,
}

/// Registry of players and projectiles shared by every session
#[derive(Debug, Default)]
pub struct EntityRegistry {
    players: DashMap<Uuid, Player>,
    projectiles: DashMap<(Uuid, ProjectileId), Projectile>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace a player record
    pub fn upsert_player(&self, player: Player) {
        self.players.insert(player.connection_id, player);
    }

    /// Replace a player's pose. Returns `None` when the player is gone.
    pub fn move_player(&self, connection_id: Uuid, pose: Pose) -> Option<Player> {
        match self.players.get_mut(&connection_id) {
            Some(mut entry) => {
                entry.pose = pose;
                Some(entry.clone())
            }
            None => {
                warn!(connection_id = %connection_id, "Move for unknown player dropped");
                None
            }
        }
    }

    /// Remove a player. Removing an absent player is a no-op.
    pub fn remove_player(&self, connection_id: Uuid) -> Option<Player> {
        self.players.remove(&connection_id).map(|(_, p)| p)
    }

    pub fn get_player(&self, connection_id: Uuid) -> Option<Player> {
        self.players.get(&connection_id).map(|p| p.value().clone())
    }

    pub fn get_all_players(&self) -> Vec<Player> {
        self.players.iter().map(|p| p.value().clone()).collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Insert or fully replace a projectile record
    pub fn upsert_projectile(&self, projectile: Projectile) {
        self.projectiles
            .insert((projectile.owner_id, projectile.projectile_id), projectile);
    }

    /// Replace a projectile's pose. Returns `None` for an unknown `(owner, id)`.
    pub fn move_projectile(
        &self,
        owner_id: Uuid,
        projectile_id: ProjectileId,
        pose: Pose,
    ) -> Option<Projectile> {
        match self.projectiles.get_mut(&(owner_id, projectile_id)) {
            Some(mut entry) => {
                entry.pose = pose;
                Some(entry.clone())
            }
            None => {
                warn!(
                    owner_id = %owner_id,
                    projectile_id,
                    "Move for unknown projectile dropped"
                );
                None
            }
        }
    }

    pub fn get_projectile(&self, owner_id: Uuid, projectile_id: ProjectileId) -> Option<Projectile> {
        self.projectiles
            .get(&(owner_id, projectile_id))
            .map(|p| p.value().clone())
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }
}
