//! # Local order registry
//!
//! Lets a machine remember "my orders" without server-side accounts: an
//! ordered list of order ids plus a "most recent active" slot, persisted as a
//! small JSON file.
//!
//! The registry is advisory. Every operation re-reads the file, so changes
//! made by another process sharing it are observed on the next call, and
//! writes go through a temp file and rename so a concurrent reader never sees
//! half a file. Ids the server no longer recognizes are pruned when
//! validation trips over them.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::order::Order;

use super::api::OrderApi;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry io: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry encode: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    orders: Vec<String>,
    latest: Option<String>,
}

pub struct OrderRegistry {
    path: PathBuf,
}

impl OrderRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends `id` to the history (an id already present is not re-added)
    /// and marks it the most recent active order.
    pub fn record_order(&self, id: &str) -> Result<(), RegistryError> {
        let id = id.trim();
        let mut file = self.read();

        if !file.orders.iter().any(|known| known == id) {
            file.orders.push(id.to_string());
        }
        file.latest = Some(id.to_string());

        self.write(&file)
    }

    /// Recorded ids, most recent first.
    pub fn list_orders(&self) -> Vec<String> {
        let mut orders = self.read().orders;
        orders.reverse();
        orders
    }

    /// Removes `id` from the history and clears the most-recent slot if it
    /// pointed at it.
    pub fn forget(&self, id: &str) -> Result<(), RegistryError> {
        let id = id.trim();
        let mut file = self.read();

        file.orders.retain(|known| known != id);
        if file.latest.as_deref() == Some(id) {
            file.latest = None;
        }

        self.write(&file)
    }

    /// The most recent active order id, unvalidated.
    pub fn latest(&self) -> Option<String> {
        self.read().latest
    }

    /// Validates the most recent active id against the server before offering
    /// to resume tracking it. A definite not-found prunes the id entirely; a
    /// terminal order clears the slot but stays in the history. A transport
    /// failure offers nothing and keeps the slot, since the order may well
    /// still be live.
    pub async fn resume_candidate(
        &self,
        api: &dyn OrderApi,
    ) -> Result<Option<Order>, RegistryError> {
        let Some(id) = self.latest() else {
            return Ok(None);
        };

        match api.fetch_order(&id).await {
            Ok(Some(order)) if !order.status.is_terminal() => Ok(Some(order)),
            Ok(Some(_)) => {
                debug!("Order {id} already delivered, clearing resume slot");
                self.clear_latest()?;
                Ok(None)
            }
            Ok(None) => {
                debug!("Order {id} unknown to the server, pruning");
                self.forget(&id)?;
                Ok(None)
            }
            Err(error) => {
                warn!("Could not validate order {id}: {error}");
                Ok(None)
            }
        }
    }

    /// Full history resolved against the server, most recent first. Ids the
    /// server no longer knows are pruned along the way.
    pub async fn order_history(&self, api: &dyn OrderApi) -> Result<Vec<Order>, RegistryError> {
        let mut orders = Vec::new();

        for id in self.list_orders() {
            match api.fetch_order(&id).await {
                Ok(Some(order)) => orders.push(order),
                Ok(None) => self.forget(&id)?,
                Err(error) => warn!("Error fetching history entry {id}: {error}"),
            }
        }

        Ok(orders)
    }

    fn clear_latest(&self) -> Result<(), RegistryError> {
        let mut file = self.read();
        file.latest = None;
        self.write(&file)
    }

    /// A missing or corrupt file is an empty registry; the next write heals
    /// it.
    fn read(&self) -> RegistryFile {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return RegistryFile::default(),
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!("Corrupt registry file, starting fresh: {error}");
            RegistryFile::default()
        })
    }

    fn write(&self, file: &RegistryFile) -> Result<(), RegistryError> {
        let raw = serde_json::to_string_pretty(file)?;
        let tmp = temp_path(&self.path);

        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, OrderRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = OrderRegistry::new(dir.path().join("orders.json"));
        (dir, registry)
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let (_dir, registry) = registry();

        registry.record_order("abc").unwrap();
        registry.record_order("abc").unwrap();

        assert_eq!(registry.list_orders(), vec!["abc"]);
        assert_eq!(registry.latest().as_deref(), Some("abc"));
    }

    #[test]
    fn listing_is_most_recent_first() {
        let (_dir, registry) = registry();

        registry.record_order("first").unwrap();
        registry.record_order("second").unwrap();
        registry.record_order("third").unwrap();

        assert_eq!(registry.list_orders(), vec!["third", "second", "first"]);
    }

    #[test]
    fn forgetting_clears_a_matching_latest_slot() {
        let (_dir, registry) = registry();

        registry.record_order("abc").unwrap();
        registry.record_order("def").unwrap();
        registry.forget("def").unwrap();

        assert_eq!(registry.list_orders(), vec!["abc"]);
        assert!(registry.latest().is_none());
    }

    #[test]
    fn external_writes_to_the_same_file_are_observed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");

        let ours = OrderRegistry::new(&path);
        let theirs = OrderRegistry::new(&path);

        ours.record_order("abc").unwrap();
        theirs.record_order("def").unwrap();

        assert_eq!(ours.list_orders(), vec!["def", "abc"]);
        assert_eq!(ours.latest().as_deref(), Some("def"));
    }

    #[test]
    fn corrupt_file_heals_to_empty() {
        let (_dir, registry) = registry();

        fs::write(&registry.path, "not json").unwrap();
        assert!(registry.list_orders().is_empty());

        registry.record_order("abc").unwrap();
        assert_eq!(registry.list_orders(), vec!["abc"]);
    }
}
