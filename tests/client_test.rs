//! Client-side behavior: the local order registry against a mocked snapshot
//! API, and a live tracking session against a real served instance.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{net::TcpListener, time::timeout};

use flashfeast::{
    client::{ClientError, HttpApi, LiveTracker, OrderApi, OrderRegistry, TrackingState},
    config::Config,
    order::{CreateOrder, Order, OrderItem, OrderStatus},
    router,
    state::AppState,
    store::{MemoryStore, OrderStore},
};

fn order_with(id: &str, status: OrderStatus) -> Order {
    let mut order = CreateOrder {
        customer_name: "Amey".into(),
        address: "123 Pune St".into(),
        phone: "9876543210".into(),
        items: vec![OrderItem {
            name: "Burger".into(),
            quantity: 1,
            price: 10.0,
        }],
        total_price: 10.0,
    }
    .into_order();
    order.id = id.to_string();
    order.status = status;
    order
}

/// Canned snapshot API; unknown ids resolve to the definite not-found.
struct FakeApi {
    orders: HashMap<String, Order>,
}

impl FakeApi {
    fn with(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders
                .into_iter()
                .map(|order| (order.id.clone(), order))
                .collect(),
        }
    }
}

#[async_trait]
impl OrderApi for FakeApi {
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, ClientError> {
        Ok(self.orders.get(id.trim()).cloned())
    }
}

fn registry() -> (tempfile::TempDir, OrderRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = OrderRegistry::new(dir.path().join("orders.json"));
    (dir, registry)
}

#[tokio::test]
async fn recording_the_same_order_twice_keeps_one_entry() {
    let (_dir, registry) = registry();

    registry.record_order("abc").unwrap();
    registry.record_order("abc").unwrap();

    assert_eq!(registry.list_orders(), vec!["abc"]);
}

#[tokio::test]
async fn delivered_latest_is_cleared_and_not_offered() {
    let (_dir, registry) = registry();
    registry.record_order("done").unwrap();

    let api = FakeApi::with([order_with("done", OrderStatus::Delivered)]);

    let candidate = registry.resume_candidate(&api).await.unwrap();
    assert!(candidate.is_none());
    assert!(registry.latest().is_none());
    // Delivered orders stay in the history.
    assert_eq!(registry.list_orders(), vec!["done"]);
}

#[tokio::test]
async fn live_latest_is_offered_for_resume() {
    let (_dir, registry) = registry();
    registry.record_order("live").unwrap();

    let api = FakeApi::with([order_with("live", OrderStatus::Preparing)]);

    let candidate = registry.resume_candidate(&api).await.unwrap().unwrap();
    assert_eq!(candidate.id, "live");
    assert_eq!(registry.latest().as_deref(), Some("live"));
}

#[tokio::test]
async fn unknown_latest_is_pruned_from_the_registry() {
    let (_dir, registry) = registry();
    registry.record_order("gone").unwrap();

    let api = FakeApi::with([]);

    let candidate = registry.resume_candidate(&api).await.unwrap();
    assert!(candidate.is_none());
    assert!(registry.latest().is_none());
    assert!(registry.list_orders().is_empty());
}

#[tokio::test]
async fn history_resolves_orders_and_prunes_stale_ids() {
    let (_dir, registry) = registry();
    registry.record_order("kept").unwrap();
    registry.record_order("stale").unwrap();

    let api = FakeApi::with([order_with("kept", OrderStatus::Delivered)]);

    let history = registry.order_history(&api).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "kept");
    assert_eq!(registry.list_orders(), vec!["kept"]);
}

/// Full pipeline over real transports: served router, WebSocket room join,
/// snapshot fetch, and the simulator driving the view to `Delivered`.
#[tokio::test]
async fn live_tracker_follows_an_order_to_delivery() {
    let config = Config {
        port: 0,
        redis_url: None,
        stage_delay: Duration::from_millis(50),
    };
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(config, store.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let order = order_with("tracked", OrderStatus::Received);
    store.insert_order(order.clone()).await.unwrap();

    let api = Arc::new(HttpApi::new(format!("http://{address}")));
    let tracker = LiveTracker::start(api, format!("ws://{address}/ws"), order.id.clone());
    let mut states = tracker.subscribe();

    // Snapshot lands first: the view is Ready before anything advances.
    timeout(Duration::from_secs(5), async {
        loop {
            states.changed().await.unwrap();
            if states.borrow().order().is_some() {
                break;
            }
        }
    })
    .await
    .expect("snapshot never arrived");

    // Wait for the room join so no push can slip past the subscription.
    timeout(Duration::from_secs(5), async {
        while state.rooms.active_rooms() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never joined the room");

    // Now let the simulation run; pushes must carry the view to Delivered.
    state.simulator.spawn(order.id.clone()).detach();

    timeout(Duration::from_secs(5), async {
        loop {
            states.changed().await.unwrap();
            let delivered = states
                .borrow()
                .order()
                .is_some_and(|order| order.status == OrderStatus::Delivered);
            if delivered {
                break;
            }
        }
    })
    .await
    .expect("order never reached Delivered");

    // Teardown releases the subscription.
    drop(tracker);
}

/// A dead subscription endpoint only costs the live updates: the snapshot
/// still renders and the view never crashes or regresses.
#[tokio::test]
async fn subscription_failure_leaves_the_snapshot_on_display() {
    let config = Config {
        port: 0,
        redis_url: None,
        stage_delay: Duration::from_millis(20),
    };
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(config, store.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let order = order_with("half-tracked", OrderStatus::Received);
    store.insert_order(order.clone()).await.unwrap();

    // Nothing listens on the ws side; only the snapshot fetch can succeed.
    let api = Arc::new(HttpApi::new(format!("http://{address}")));
    let tracker = LiveTracker::start(api, "ws://127.0.0.1:1/ws".into(), order.id.clone());
    let mut states = tracker.subscribe();

    timeout(Duration::from_secs(5), states.changed())
        .await
        .expect("snapshot never arrived")
        .unwrap();
    assert_eq!(
        states.borrow().order().unwrap().status,
        OrderStatus::Received
    );

    // The order advances server-side, but with no subscription the view
    // stays at the last known snapshot.
    state.simulator.spawn(order.id.clone()).done().await;
    assert_eq!(
        states.borrow().order().unwrap().status,
        OrderStatus::Received
    );
}

#[tokio::test]
async fn live_tracker_terminates_in_not_found_for_unknown_ids() {
    let config = Config {
        port: 0,
        redis_url: None,
        stage_delay: Duration::from_secs(10),
    };
    let state = AppState::with_store(config, Arc::new(MemoryStore::new()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let api = Arc::new(HttpApi::new(format!("http://{address}")));
    let tracker = LiveTracker::start(api, format!("ws://{address}/ws"), "no-such".into());
    let mut states = tracker.subscribe();

    timeout(Duration::from_secs(5), async {
        loop {
            states.changed().await.unwrap();
            if matches!(*states.borrow(), TrackingState::NotFound) {
                break;
            }
        }
    })
    .await
    .expect("view never terminated");
}
