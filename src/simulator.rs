//! # Status simulator
//!
//! Stands in for a real fulfillment signal: each created order is walked
//! through `Preparing`, `Out for Delivery`, `Delivered` at a fixed per-stage
//! delay, purely on elapsed time.
//!
//! One task per order owns the whole remaining schedule, so a
//! [`SimulationHandle::cancel`] removes every pending transition as a unit.
//! A transition that finds the record gone logs and skips publication, but
//! the later stages still attempt their own update the same way; the create
//! path has long since returned and nobody is waiting on the outcome.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{info, warn};

use crate::{
    order::OrderStatus,
    rooms::Rooms,
    store::OrderStore,
};

#[derive(Clone)]
pub struct StatusSimulator {
    store: Arc<dyn OrderStore>,
    rooms: Rooms,
    stage_delay: Duration,
}

/// Owner of one order's remaining schedule. Dropping the handle detaches the
/// simulation (fire-and-forget); cancelling aborts it as a unit.
pub struct SimulationHandle {
    task: JoinHandle<()>,
}

impl SimulationHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Explicit fire-and-forget at the call site.
    pub fn detach(self) {}

    /// Waits for the full schedule to run out. Test seam; production code
    /// never blocks on a simulation.
    pub async fn done(self) {
        let _ = self.task.await;
    }
}

impl StatusSimulator {
    pub fn new(store: Arc<dyn OrderStore>, rooms: Rooms, stage_delay: Duration) -> Self {
        Self {
            store,
            rooms,
            stage_delay,
        }
    }

    /// Schedules the three remaining transitions for a freshly created order.
    /// Returns immediately; the first transition fires one stage delay from
    /// now.
    pub fn spawn(&self, order_id: String) -> SimulationHandle {
        let store = self.store.clone();
        let rooms = self.rooms.clone();
        let stage_delay = self.stage_delay;

        let task = tokio::spawn(async move {
            for status in OrderStatus::SEQUENCE.into_iter().skip(1) {
                sleep(stage_delay).await;

                match store.update_status(&order_id, status).await {
                    Ok(Some(updated)) => {
                        info!("Order {order_id} status: {status}");
                        rooms.publish(&order_id, &updated);
                    }
                    Ok(None) => {
                        warn!("Order {order_id} no longer exists, skipping {status} update");
                    }
                    Err(error) => {
                        warn!("Simulation error for order {order_id} at {status}: {error}");
                    }
                }
            }
        });

        SimulationHandle { task }
    }
}
