//! Arena synchronization core

pub mod arena;
pub mod broadcast;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod teams;

pub use arena::Arena;
pub use broadcast::{BroadcastRouter, Outbound, OutboundRx};
pub use registry::{EntityRegistry, Player, Pose, Projectile, ProjectileId};
pub use scoring::{ScoreTally, Scoreboard};
pub use session::{Session, SessionError};
pub use teams::{Team, TeamAssigner};
