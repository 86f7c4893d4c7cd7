use std::sync::Arc;

use tracing::info;

use crate::{
    config::Config,
    rooms::Rooms,
    simulator::StatusSimulator,
    store::{MemoryStore, OrderStore, RedisStore},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn OrderStore>,
    pub rooms: Rooms,
    pub simulator: StatusSimulator,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn OrderStore> = match &config.redis_url {
            Some(url) => Arc::new(
                RedisStore::connect(url)
                    .await
                    .expect("Redis misconfigured!"),
            ),
            None => {
                info!("REDIS_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Wires the room registry and the simulator around an explicit store.
    /// The room publisher is threaded into the simulator here and nowhere
    /// else; nothing reaches it ambiently.
    pub fn with_store(config: Config, store: Arc<dyn OrderStore>) -> Arc<Self> {
        let rooms = Rooms::new();
        let simulator = StatusSimulator::new(store.clone(), rooms.clone(), config.stage_delay);

        Arc::new(Self {
            config,
            store,
            rooms,
            simulator,
        })
    }
}
