//! Call-center analytics service: aggregation queries over calls, sentiment
//! analyses and escalations, served over HTTP, plus a typed client for the
//! dashboard views.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod escalation;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod report;
pub mod store;

pub use api::router;
pub use client::ReportingClient;
pub use config::Config;
pub use db::PgStore;
pub use error::ApiError;
pub use memory::MemoryStore;
pub use store::{MetricsStore, StoreError};
