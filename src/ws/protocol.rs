//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{Player, Pose, ProjectileId, ScoreTally, Team};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Own ship moved
    MovePlayer {
        x: f32,
        y: f32,
        /// Rotation in radians
        rotation: f32,
    },

    /// A projectile was fired locally
    SpawnProjectile {
        x: f32,
        y: f32,
        rotation: f32,
        /// Client-assigned id, unique only for this connection
        projectile_id: ProjectileId,
    },

    /// One of our own projectiles moved
    MoveProjectile {
        x: f32,
        y: f32,
        rotation: f32,
        projectile_id: ProjectileId,
    },

    /// Our own ship was hit
    ReportExplosion,
}

impl ClientMsg {
    /// Decode a text frame, rejecting anything with a missing or mistyped field
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// Event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MovePlayer { .. } => "move_player",
            Self::SpawnProjectile { .. } => "spawn_projectile",
            Self::MoveProjectile { .. } => "move_projectile",
            Self::ReportExplosion => "report_explosion",
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Every connected player, sent once to a newly joined connection
    SnapshotPlayers {
        players: HashMap<Uuid, PlayerInfo>,
    },

    /// Current kill tally
    ScoreUpdate {
        red: u32,
        blue: u32,
    },

    /// Player joined the arena
    PlayerJoined {
        player: PlayerInfo,
    },

    /// Player left the arena
    PlayerLeft {
        connection_id: Uuid,
    },

    PlayerMoved {
        connection_id: Uuid,
        x: f32,
        y: f32,
        rotation: f32,
    },

    ProjectileSpawned {
        owner_id: Uuid,
        projectile_id: ProjectileId,
        x: f32,
        y: f32,
        rotation: f32,
    },

    ProjectileMoved {
        owner_id: Uuid,
        projectile_id: ProjectileId,
        x: f32,
        y: f32,
        rotation: f32,
    },

    /// A ship was destroyed
    ExplosionAnnounced {
        connection_id: Uuid,
    },
}

impl ServerMsg {
    pub fn score_update(tally: ScoreTally) -> Self {
        Self::ScoreUpdate {
            red: tally.red,
            blue: tally.blue,
        }
    }

    pub fn player_moved(connection_id: Uuid, pose: Pose) -> Self {
        Self::PlayerMoved {
            connection_id,
            x: pose.x,
            y: pose.y,
            rotation: pose.rotation,
        }
    }
}

/// Player info for snapshots and join announcements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub connection_id: Uuid,
    /// Position X
    pub x: f32,
    /// Position Y
    pub y: f32,
    /// Rotation in radians
    pub rotation: f32,
    pub team: Team,
}

impl From<&Player> for PlayerInfo {
    fn from(player: &Player) -> Self {
        Self {
            connection_id: player.connection_id,
            x: player.pose.x,
            y: player.pose.y,
            rotation: player.pose.rotation,
            team: player.team,
        }
    }
}

/// Inbound frames that cannot be turned into a `ClientMsg`
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed client message: {0}")]
    Malformed(#[source] serde_json::Error),
}
