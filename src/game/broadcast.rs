//! Broadcast router - fan-out of server events to session outbound queues
//!
//! Each session owns a bounded queue with a single receiver (its socket
//! writer). Pushing never blocks: once a slow client's queue is full the
//! oldest queued events are overwritten and the writer observes `Lagged`.
//! Events pushed to one recipient keep their relative order.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::config::MIN_OUTBOUND_BUFFER;
use crate::ws::protocol::ServerMsg;

/// Receiving half of a session's outbound queue
pub type OutboundRx = broadcast::Receiver<ServerMsg>;

/// Sending half of a session's outbound queue
#[derive(Clone, Debug)]
pub struct Outbound {
    tx: broadcast::Sender<ServerMsg>,
}

impl Outbound {
    /// Create a queue holding at most `capacity` undelivered events.
    /// Never smaller than `MIN_OUTBOUND_BUFFER`, so a join preamble survives.
    pub fn channel(capacity: usize) -> (Self, OutboundRx) {
        let (tx, rx) = broadcast::channel(capacity.max(MIN_OUTBOUND_BUFFER));
        (Self { tx }, rx)
    }

    /// Queue an event. Returns `false` when the receiver is gone.
    pub fn push(&self, msg: ServerMsg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Routes events to every attached session
pub struct BroadcastRouter {
    sessions: DashMap<Uuid, Outbound>,
    capacity: usize,
}

impl BroadcastRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            capacity,
        }
    }

    /// New outbound queue sized for this router, not yet attached
    pub fn open(&self) -> (Outbound, OutboundRx) {
        Outbound::channel(self.capacity)
    }

    /// Make a session reachable by broadcasts
    pub fn attach(&self, connection_id: Uuid, outbound: Outbound) {
        self.sessions.insert(connection_id, outbound);
    }

    /// Stop routing to a session. Returns `false` if it was not attached.
    pub fn detach(&self, connection_id: Uuid) -> bool {
        self.sessions.remove(&connection_id).is_some()
    }

    /// Deliver to a single session
    pub fn send_to(&self, connection_id: Uuid, msg: ServerMsg) -> bool {
        self.sessions
            .get(&connection_id)
            .map(|outbound| outbound.push(msg))
            .unwrap_or(false)
    }

    /// Deliver to every attached session except `origin`.
    /// Returns the number of queues the event was placed on.
    pub fn broadcast_except(&self, origin: Uuid, msg: &ServerMsg) -> usize {
        self.fan_out(Some(origin), msg)
    }

    /// Deliver to every attached session, including the originator
    pub fn broadcast_all(&self, msg: &ServerMsg) -> usize {
        self.fan_out(None, msg)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn fan_out(&self, skip: Option<Uuid>, msg: &ServerMsg) -> usize {
        let mut delivered = 0;
        for entry in self.sessions.iter() {
            if Some(*entry.key()) == skip {
                continue;
            }
            if entry.value().push(msg.clone()) {
                delivered += 1;
            } else {
                // Writer already gone; its session cleanup will detach it
                trace!(connection_id = %entry.key(), "Outbound queue closed");
            }
        }
        delivered
    }
}
