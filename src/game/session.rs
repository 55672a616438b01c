//! Per-connection session: join, inbound event dispatch, leave

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg};

use super::{Arena, OutboundRx, Player, Pose, Projectile, ProjectileId};

/// Why an inbound event was dropped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("player {0} is not registered")]
    UnknownPlayer(Uuid),

    #[error("projectile {projectile_id} of {owner_id} is not registered")]
    UnknownProjectile {
        owner_id: Uuid,
        projectile_id: ProjectileId,
    },

    #[error("session already closed")]
    Closed,
}

/// Server-side state bound to one live connection.
///
/// Leaving runs at most once, whether triggered explicitly or by drop.
pub struct Session {
    connection_id: Uuid,
    arena: Arc<Arena>,
    closed: AtomicBool,
}

impl Session {
    /// Register a new player and announce it.
    ///
    /// The returned queue already holds the player snapshot followed by the
    /// current score; everyone else receives `player_joined`.
    pub fn join(arena: Arc<Arena>) -> (Self, OutboundRx) {
        let connection_id = Uuid::new_v4();
        let (outbound, rx) = arena.router.open();

        let player = {
            let _membership = arena.membership.lock();

            let (team, pose) = arena.teams.assign();
            let player = Player {
                connection_id,
                team,
                pose,
            };
            arena.registry.upsert_player(player.clone());

            let players: HashMap<Uuid, PlayerInfo> = arena
                .registry
                .get_all_players()
                .iter()
                .map(|p| (p.connection_id, PlayerInfo::from(p)))
                .collect();
            outbound.push(ServerMsg::SnapshotPlayers { players });

            // Attach under the tally lock so no score update slips between
            // the one queued here and the first one broadcast to us
            arena.scores.with_tally(|tally| {
                outbound.push(ServerMsg::score_update(tally));
                arena.router.attach(connection_id, outbound);
            });

            arena.router.broadcast_except(
                connection_id,
                &ServerMsg::PlayerJoined {
                    player: PlayerInfo::from(&player),
                },
            );
            player
        };

        info!(
            connection_id = %connection_id,
            team = ?player.team,
            x = player.pose.x,
            y = player.pose.y,
            players = arena.registry.player_count(),
            "Player joined"
        );

        let session = Self {
            connection_id,
            arena,
            closed: AtomicBool::new(false),
        };
        (session, rx)
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Apply one inbound client event and fan out the result
    pub fn handle(&self, msg: ClientMsg) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let id = self.connection_id;
        let arena = &self.arena;

        match msg {
            ClientMsg::MovePlayer { x, y, rotation } => {
                let player = arena
                    .registry
                    .move_player(id, Pose { x, y, rotation })
                    .ok_or(SessionError::UnknownPlayer(id))?;
                arena
                    .router
                    .broadcast_except(id, &ServerMsg::player_moved(id, player.pose));
            }
            ClientMsg::SpawnProjectile {
                x,
                y,
                rotation,
                projectile_id,
            } => {
                if arena.registry.get_player(id).is_none() {
                    return Err(SessionError::UnknownPlayer(id));
                }
                arena.registry.upsert_projectile(Projectile {
                    owner_id: id,
                    projectile_id,
                    pose: Pose { x, y, rotation },
                });
                arena.router.broadcast_except(
                    id,
                    &ServerMsg::ProjectileSpawned {
                        owner_id: id,
                        projectile_id,
                        x,
                        y,
                        rotation,
                    },
                );
                debug!(connection_id = %id, projectile_id, "Projectile spawned");
            }
            ClientMsg::MoveProjectile {
                x,
                y,
                rotation,
                projectile_id,
            } => {
                let projectile = arena
                    .registry
                    .move_projectile(id, projectile_id, Pose { x, y, rotation })
                    .ok_or(SessionError::UnknownProjectile {
                        owner_id: id,
                        projectile_id,
                    })?;
                arena.router.broadcast_except(
                    id,
                    &ServerMsg::ProjectileMoved {
                        owner_id: id,
                        projectile_id,
                        x: projectile.pose.x,
                        y: projectile.pose.y,
                        rotation: projectile.pose.rotation,
                    },
                );
            }
            ClientMsg::ReportExplosion => {
                arena
                    .scores
                    .report_explosion(id, &arena.registry, &arena.router)
                    .ok_or(SessionError::UnknownPlayer(id))?;
            }
        }

        Ok(())
    }

    /// Remove the player and tell everyone else.
    ///
    /// Returns `true` only for the call that actually performed the cleanup.
    pub fn leave(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let id = self.connection_id;
        let arena = &self.arena;

        let removed = {
            let _membership = arena.membership.lock();
            arena.router.detach(id);
            let removed = arena.registry.remove_player(id);
            if removed.is_some() {
                arena
                    .router
                    .broadcast_all(&ServerMsg::PlayerLeft { connection_id: id });
            }
            removed
        };

        info!(
            connection_id = %id,
            team = ?removed.map(|p| p.team),
            players = arena.registry.player_count(),
            "Player left"
        );
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.leave();
    }
}
