//! # Order tracking
//!
//! One order, two independent update sources: a one-time snapshot fetch and a
//! stream of pushed records. [`Tracker`] is the pure reconciliation core;
//! [`LiveTracker`] wires it to the real HTTP and WebSocket transports.
//!
//! Reconciliation replaces the displayed record in full, with one guard: once
//! a record is shown, an update whose status rank is not greater than the
//! displayed rank is ignored. Status is monotonic at the source, so the guard
//! makes the view immune to fetch/push races and to reordered delivery
//! without carrying sequence numbers on the wire.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::{sync::watch, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::{
    order::{Order, OrderStatus},
    rooms::WireMessage,
};

use super::api::{ClientError, OrderApi};

/// View state for one tracked order.
#[derive(Debug, Clone)]
pub enum TrackingState {
    Loading,
    Ready(Order),
    /// Terminal: the fetch failed or the server does not know the id. Pushes
    /// arriving afterwards are ignored.
    NotFound,
}

impl TrackingState {
    pub fn order(&self) -> Option<&Order> {
        match self {
            TrackingState::Ready(order) => Some(order),
            _ => None,
        }
    }
}

/// How one stage of the four-stage sequence should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageView {
    Completed,
    /// The active stage while the order is still moving.
    InProgress,
    /// The active stage once the order is terminal.
    Delivered,
    Pending,
}

#[derive(Debug, Default)]
pub struct Tracker {
    state: TrackingState,
}

impl Default for TrackingState {
    fn default() -> Self {
        TrackingState::Loading
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Result of the one-time snapshot fetch. `None` covers both a definite
    /// not-found and a failed fetch; either way the view terminates rather
    /// than loading forever.
    pub fn apply_snapshot(&mut self, fetched: Option<Order>) -> bool {
        match (&self.state, fetched) {
            (TrackingState::Loading, Some(order)) => {
                self.state = TrackingState::Ready(order);
                true
            }
            (TrackingState::Loading, None) => {
                self.state = TrackingState::NotFound;
                true
            }
            // A push beat the fetch; only a strictly newer snapshot wins.
            (TrackingState::Ready(current), Some(order)) if order.status > current.status => {
                self.state = TrackingState::Ready(order);
                true
            }
            _ => false,
        }
    }

    /// A record pushed over the subscription channel.
    pub fn apply_push(&mut self, order: Order) -> bool {
        match &self.state {
            TrackingState::Loading => {
                self.state = TrackingState::Ready(order);
                true
            }
            TrackingState::Ready(current) if order.status > current.status => {
                self.state = TrackingState::Ready(order);
                true
            }
            _ => false,
        }
    }

    /// The linear progress indicator, one view per lifecycle stage. `None`
    /// until an order is on display.
    pub fn stage_views(&self) -> Option<[StageView; 4]> {
        let order = self.state.order()?;
        let current = order.status.rank();

        let mut views = [StageView::Pending; 4];
        for (index, view) in views.iter_mut().enumerate() {
            *view = if index < current {
                StageView::Completed
            } else if index == current {
                if order.status.is_terminal() {
                    StageView::Delivered
                } else {
                    StageView::InProgress
                }
            } else {
                StageView::Pending
            };
        }

        Some(views)
    }
}

/// Live tracking session for one order id: snapshot fetch and room
/// subscription run concurrently, every accepted update is published on a
/// watch channel. Dropping the tracker actively releases the subscription by
/// aborting both tasks.
pub struct LiveTracker {
    state_rx: watch::Receiver<TrackingState>,
    fetch_task: JoinHandle<()>,
    subscribe_task: JoinHandle<()>,
}

impl LiveTracker {
    /// `ws_url` like `ws://localhost:5000/ws`.
    pub fn start(api: Arc<dyn OrderApi>, ws_url: String, order_id: String) -> Self {
        let (state_tx, state_rx) = watch::channel(TrackingState::Loading);
        let tracker = Arc::new(Mutex::new(Tracker::new()));

        let fetch_task = tokio::spawn(fetch_snapshot(
            api,
            order_id.clone(),
            tracker.clone(),
            state_tx.clone(),
        ));
        let subscribe_task = tokio::spawn(subscribe_room(ws_url, order_id, tracker, state_tx));

        Self {
            state_rx,
            fetch_task,
            subscribe_task,
        }
    }

    /// Watch the view state; borrow-and-clone to read, `changed().await` to
    /// wait for the next accepted update.
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state_rx.clone()
    }

    pub fn stop(&self) {
        self.fetch_task.abort();
        self.subscribe_task.abort();
    }
}

impl Drop for LiveTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn fetch_snapshot(
    api: Arc<dyn OrderApi>,
    order_id: String,
    tracker: Arc<Mutex<Tracker>>,
    state_tx: watch::Sender<TrackingState>,
) {
    let fetched = match api.fetch_order(&order_id).await {
        Ok(found) => found,
        Err(error) => {
            warn!("Error fetching order details: {error}");
            None
        }
    };

    let mut tracker = tracker.lock().expect("tracker lock poisoned");
    if tracker.apply_snapshot(fetched) {
        let _ = state_tx.send(tracker.state().clone());
    }
}

async fn subscribe_room(
    ws_url: String,
    order_id: String,
    tracker: Arc<Mutex<Tracker>>,
    state_tx: watch::Sender<TrackingState>,
) {
    // A dead subscription must not take down the view; the last snapshot
    // simply stays on display.
    if let Err(error) = run_subscription(ws_url, order_id, tracker, state_tx).await {
        warn!("Subscription lost, live updates disabled: {error}");
    }
}

async fn run_subscription(
    ws_url: String,
    order_id: String,
    tracker: Arc<Mutex<Tracker>>,
    state_tx: watch::Sender<TrackingState>,
) -> Result<(), ClientError> {
    let (mut socket, _) = connect_async(ws_url.as_str()).await?;

    let join = serde_json::to_string(&WireMessage::JoinOrder { order_id })?;
    socket.send(Message::Text(join.into())).await?;

    while let Some(frame) = socket.next().await {
        let frame = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<WireMessage>(frame.as_ref()) {
            Ok(WireMessage::StatusUpdate { order }) => {
                let mut tracker = tracker.lock().expect("tracker lock poisoned");
                if tracker.apply_push(order) {
                    let _ = state_tx.send(tracker.state().clone());
                }
            }
            Ok(other) => debug!("Ignoring unexpected server message: {other:?}"),
            Err(error) => debug!("Unparseable server message: {error}"),
        }
    }

    Ok(())
}
