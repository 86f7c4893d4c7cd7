//! Client-side tracking library: the snapshot API, the reconciliation state
//! machine behind the progress view, and the locally persisted registry of
//! orders this machine has placed.

pub mod api;
pub mod registry;
pub mod tracker;

pub use api::{ClientError, HttpApi, OrderApi};
pub use registry::OrderRegistry;
pub use tracker::{LiveTracker, StageView, Tracker, TrackingState};
