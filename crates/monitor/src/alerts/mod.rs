//! Alert records, filtering, and in-memory storage.

pub mod filter;
pub mod store;
pub mod types;

pub use filter::{filter_alerts, Selector};
pub use store::{AlertStore, StoreError};
pub use types::{
    AlertSeverity, AlertStatus, ContentAlert, InvalidTransition, Platform, Sentiment,
};
