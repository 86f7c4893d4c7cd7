use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    menu::{MenuItem, sample_menu},
    order::{CreateOrder, Order},
    rooms::WireMessage,
    state::AppState,
};

/// POST /api/orders. Validates, persists with initial status, kicks off the
/// simulation, and returns before any transition fires.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrder>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let order = payload.into_order();
    state.store.insert_order(order.clone()).await?;
    state.simulator.spawn(order.id.clone()).detach();

    info!("Order {} created for {}", order.id, order.customer_name);

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}. Snapshot read, no side effects. Unknown ids are a
/// distinct not-found signal, never folded into a server error.
pub async fn order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    state
        .store
        .fetch_order(id.trim())
        .await?
        .map(Json)
        .ok_or(AppError::OrderNotFound)
}

/// GET /api/menu.
pub async fn menu(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.store.menu_items().await?))
}

/// GET /api/menu/seed. A GET so the catalog can be seeded from a browser.
pub async fn seed_menu(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    state.store.replace_menu(sample_menu()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Menu seeded" })),
    ))
}

/// GET /ws. The subscription socket: the client sends a `joinOrder` frame and
/// then receives `statusUpdate` frames for that order until it disconnects.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();

    // One subscription at a time; re-joining drops the previous room.
    let mut subscription: Option<broadcast::Receiver<Order>> = None;

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WireMessage>(text.as_ref()) {
                            Ok(WireMessage::JoinOrder { order_id }) => {
                                debug!("Client joined room for order {}", order_id.trim());
                                subscription = Some(state.rooms.subscribe(&order_id));
                            }
                            Ok(other) => {
                                debug!("Ignoring unexpected client message: {other:?}");
                            }
                            Err(error) => {
                                debug!("Unparseable client message: {error}");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        debug!("Subscription socket error: {error}");
                        break;
                    }
                }
            }
            pushed = next_update(&mut subscription) => {
                match pushed {
                    Ok(order) => {
                        if forward_update(&mut sink, order).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Subscriber lagged, dropped {missed} updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        subscription = None;
                    }
                }
            }
        }
    }
    // Dropping the receiver is the implicit unsubscribe.
}

/// Pends forever while no room is joined so the select stays on incoming
/// frames only.
async fn next_update(
    subscription: &mut Option<broadcast::Receiver<Order>>,
) -> Result<Order, broadcast::error::RecvError> {
    match subscription {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn forward_update(
    sink: &mut SplitSink<WebSocket, Message>,
    order: Order,
) -> Result<(), axum::Error> {
    let frame = WireMessage::StatusUpdate { order };
    let text = serde_json::to_string(&frame).unwrap_or_default();
    sink.send(Message::Text(text.into())).await
}
