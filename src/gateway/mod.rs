//! Remote data gateway: the row-store contract the engine talks to.

pub mod auth;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use auth::{AuthClient, SessionWatcher};
pub use rest::RestGateway;

/// A category row in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// A site row in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRow {
    pub id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Rank assignment used when persisting a reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteOrderRow {
    pub id: String,
    pub sort_order: i32,
}

/// Field update for an existing site. All fields are written; the id and
/// rank are addressed separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePatch {
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub shortcut: String,
    pub emoji: String,
}

/// Everything a full fetch returns, already ordered by rank then name/label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub categories: Vec<CategoryRow>,
    pub sites: Vec<SiteRow>,
}

/// Error from gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Row-store operations the engine depends on.
///
/// Batch calls have whole-call failure semantics: a failure on any row is a
/// failure of the call, and the engine assumes nothing was committed.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch all categories and sites, ordered by `sort_order` ascending,
    /// then by label/name ascending for stability.
    async fn fetch_all(&self) -> Result<Snapshot, GatewayError>;

    /// Insert-or-update categories keyed by id. Idempotent for identical
    /// payloads, which makes reseeding safe to repeat.
    async fn upsert_categories(&self, rows: &[CategoryRow]) -> Result<(), GatewayError>;

    /// Plain insert of site rows. Fails on duplicate ids, so callers only
    /// seed sites into a remote confirmed to be empty (or just cleared).
    async fn insert_sites(&self, rows: &[SiteRow]) -> Result<(), GatewayError>;

    /// Update one site's fields.
    async fn update_site(&self, id: &str, patch: &SitePatch) -> Result<(), GatewayError>;

    /// Delete one site.
    async fn delete_site(&self, id: &str) -> Result<(), GatewayError>;

    /// Delete every site row. Used by reset-to-defaults before reseeding.
    async fn delete_all_sites(&self) -> Result<(), GatewayError>;

    /// Persist new ranks for the given sites, keyed by id.
    async fn upsert_site_order(&self, rows: &[SiteOrderRow]) -> Result<(), GatewayError>;
}
