//! # Subscription rooms
//!
//! Publish/subscribe keyed by order id. A client joins the room for the order
//! it is tracking; the simulator publishes each transition into that room and
//! nothing else.
//!
//! ## Guarantees
//!
//! - Delivery to whoever is subscribed at the instant of publish. Late
//!   joiners fetch a snapshot instead; nothing is replayed.
//! - Fan-out never blocks the publisher. A subscriber that stops draining its
//!   receiver lags and drops messages without delaying anyone else.
//! - Keys are normalized identically on both sides, otherwise a stray space
//!   would silently route updates into an empty room.
//!
//! Rooms hold no state beyond their broadcast sender. Every subscribe and
//! publish sweeps the registry, dropping rooms whose receivers are all gone,
//! so the map is bounded by the number of currently tracked orders.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::order::Order;

/// Per-room buffer. Deep enough for a full lifecycle; a subscriber lagging
/// past it loses the oldest updates, not the newest.
const ROOM_CAPACITY: usize = 16;

/// Both the join path and the publish path key rooms through here.
pub fn normalize_room_key(order_id: &str) -> String {
    order_id.trim().to_string()
}

/// Messages exchanged over the subscription socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    #[serde(rename_all = "camelCase")]
    JoinOrder { order_id: String },
    StatusUpdate { order: Order },
}

#[derive(Clone, Default)]
pub struct Rooms {
    inner: Arc<Mutex<HashMap<String, broadcast::Sender<Order>>>>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the room for `order_id`, creating it if nobody is there yet.
    /// Dropping the receiver leaves the room; no explicit unsubscribe.
    pub fn subscribe(&self, order_id: &str) -> broadcast::Receiver<Order> {
        let key = normalize_room_key(order_id);
        let mut rooms = self.inner.lock().expect("rooms lock poisoned");
        sweep(&mut rooms);

        rooms
            .entry(key)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Best-effort fan-out to the room's current members. Returns how many
    /// receivers the update was handed to; an empty or missing room is zero
    /// and never an error.
    pub fn publish(&self, order_id: &str, order: &Order) -> usize {
        let key = normalize_room_key(order_id);
        let mut rooms = self.inner.lock().expect("rooms lock poisoned");
        sweep(&mut rooms);

        let Some(sender) = rooms.get(&key) else {
            debug!("No room for order {key}, dropping update");
            return 0;
        };

        sender.send(order.clone()).unwrap_or(0)
    }

    /// Number of live rooms, counting only those with at least one member.
    pub fn active_rooms(&self) -> usize {
        let mut rooms = self.inner.lock().expect("rooms lock poisoned");
        sweep(&mut rooms);
        rooms.len()
    }

    /// Raw registry size, sweep-free, so tests can observe stale entries.
    #[cfg(test)]
    fn room_count(&self) -> usize {
        self.inner.lock().expect("rooms lock poisoned").len()
    }
}

/// Drops every room whose members are all gone. An order's room would
/// otherwise outlive its last subscriber whenever the final publish happened
/// while that subscriber was still connected.
fn sweep(rooms: &mut HashMap<String, broadcast::Sender<Order>>) {
    rooms.retain(|_, sender| sender.receiver_count() > 0);
}
