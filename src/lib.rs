//! Ship Arena Server - real-time state synchronization for a two-team ship arena
//!
//! Clients connect over WebSocket, report their own ship and projectile
//! movement, and report when their ship explodes. The server keeps the
//! authoritative player and projectile records, relays every update to the
//! other connections, and keeps the team score.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

pub use app::AppState;
pub use config::Config;
pub use http::build_router;
