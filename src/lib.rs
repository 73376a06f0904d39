//! linkboard: the synchronization core of a categorized bookmark dashboard.
//!
//! The engine reconciles three data sources — the in-memory collection, a
//! versioned local cache snapshot, and an optional remote row store — while
//! enforcing an admin-gated write capability. Reads flow remote → engine →
//! presentation; cloud writes are confirmed by a full refetch rather than a
//! local patch, so convergence is last-write-wins by construction.
//!
//! The [`proxy`] module hosts the credential-hiding passthrough that lets a
//! browser client reach the remote store without ever seeing the service
//! credential; `linkboard-proxy` serves it.

pub mod access;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod model;
pub mod proxy;
pub mod search;

pub use access::{AccessEvent, Identity};
pub use cache::CacheStore;
pub use config::RemoteConfig;
pub use engine::{StatusMessage, SyncEngine, SyncError, SyncPhase, SyncState};
pub use model::{Category, Site, SiteDraft};

/// Build the passthrough router with the given configuration.
pub fn create_proxy_router(config: proxy::ProxyConfig) -> axum::Router {
    proxy::router(config)
}
