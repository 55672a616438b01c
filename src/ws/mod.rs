//! WebSocket transport: wire schema and connection handling

pub mod handler;
pub mod protocol;
