use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Unset means the in-memory store; orders then live only as long as the
    /// process, which is fine for local runs and tests.
    pub redis_url: Option<String>,
    /// Gap between simulated lifecycle stages.
    pub stage_delay: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "5000"),
            redis_url: env::var("REDIS_URL").ok(),
            stage_delay: Duration::from_secs(try_load("STAGE_DELAY_SECS", "10")),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
