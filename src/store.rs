//! # Order Store
//!
//! Durable record per order behind the [`OrderStore`] seam. Two backends:
//!
//! - [`RedisStore`]: Redis via a [`ConnectionManager`], records as JSON values
//!   keyed `order:{id}`. The simulator is the sole status writer after
//!   creation, so the get-modify-set in [`RedisStore::update_status`] has no
//!   competing writer to race with.
//! - [`MemoryStore`]: in-process map for tests and redis-less runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tracing::info;

use crate::{
    menu::MenuItem,
    order::{Order, OrderStatus},
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a freshly created record.
    async fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    /// Current snapshot, or `None` for an id the store does not recognize.
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, StoreError>;

    /// Atomic find-and-update of the status field, returning the updated
    /// record. `None` means the record vanished; callers decide what to do.
    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;

    async fn menu_items(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// Replaces the whole catalog, so reseeding never duplicates.
    async fn replace_menu(&self, items: Vec<MenuItem>) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<String, Order>>,
    menu: RwLock<Vec<MenuItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a record outright. Test hook for exercising mid-simulation
    /// deletion; no HTTP surface exposes this.
    pub fn remove_order(&self, id: &str) -> Option<Order> {
        self.orders.write().expect("orders lock poisoned").remove(id)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        self.orders
            .write()
            .expect("orders lock poisoned")
            .insert(order.id.clone(), order);
        Ok(())
    }

    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .expect("orders lock poisoned")
            .get(id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut orders = self.orders.write().expect("orders lock poisoned");
        Ok(orders.get_mut(id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    async fn menu_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self.menu.read().expect("menu lock poisoned").clone())
    }

    async fn replace_menu(&self, items: Vec<MenuItem>) -> Result<(), StoreError> {
        *self.menu.write().expect("menu lock poisoned") = items;
        Ok(())
    }
}

const ORDER_KEY_PREFIX: &str = "order:";
const MENU_KEY: &str = "menu";

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(100));

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        info!("Connected to redis at {redis_url}");

        Ok(Self { connection })
    }

    fn order_key(id: &str) -> String {
        format!("{ORDER_KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl OrderStore for RedisStore {
    async fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let raw = serde_json::to_string(&order)?;
        let _: () = connection.set(Self::order_key(&order.id), raw).await?;
        Ok(())
    }

    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(Self::order_key(id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut connection = self.connection.clone();
        let key = Self::order_key(id);
        let raw: Option<String> = connection.get(&key).await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut order: Order = serde_json::from_str(&raw)?;
        order.status = status;

        let updated = serde_json::to_string(&order)?;
        let _: () = connection.set(&key, updated).await?;

        Ok(Some(order))
    }

    async fn menu_items(&self) -> Result<Vec<MenuItem>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(MENU_KEY).await?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn replace_menu(&self, items: Vec<MenuItem>) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let raw = serde_json::to_string(&items)?;
        let _: () = connection.set(MENU_KEY, raw).await?;
        Ok(())
    }
}
