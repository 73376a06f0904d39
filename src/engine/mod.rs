//! Synchronization engine: loads and reconciles the collection across the
//! in-memory state, the local cache, and (when configured) the remote store.

pub mod store;

use crate::access::{self, AccessEvaluator, AccessEvent, Identity};
use crate::cache::{CacheStore, Theme};
use crate::gateway::{Gateway, GatewayError, SiteOrderRow};
use crate::model::{Category, DraftError, Site, SiteDraft, Tone};
use crate::search;
use std::sync::Arc;
use store::{CloudStore, LocalStore, Mutation, MutationStore};
use tracing::{error, info};

/// Engine phase. `Local` is terminal when no remote is configured; the
/// other three cycle as fetches and confirmed writes come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Local,
    Loading,
    Ready,
    Error,
}

/// Phase plus the banner text that goes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub message: String,
}

impl SyncState {
    fn local() -> Self {
        Self {
            phase: SyncPhase::Local,
            message: String::new(),
        }
    }

    fn loading(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Loading,
            message: message.into(),
        }
    }

    fn ready(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Ready,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Error,
            message: message.into(),
        }
    }
}

/// Transient operation feedback (distinct from the sync banner).
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: Tone,
}

/// Error from an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no permission to manage sites")]
    PermissionDenied,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Where a refresh pipeline fell over; used to pick the banner text.
#[derive(Debug)]
pub(crate) enum RefreshFailure {
    Fetch(GatewayError),
    Seed(GatewayError),
    Refetch(GatewayError),
}

impl From<RefreshFailure> for SyncError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::Fetch(err)
            | RefreshFailure::Seed(err)
            | RefreshFailure::Refetch(err) => SyncError::Gateway(err),
        }
    }
}

/// The operating mode for one operation, resolved once at its entry point.
enum OperatingMode {
    Local,
    Cloud(Arc<dyn Gateway>),
}

const MSG_CONNECTING: &str = "Connecting to the cloud...";
const MSG_CONNECTED: &str = "Loaded the latest cloud data ✅";
const MSG_REFRESHING: &str = "Refreshing cloud data...";
const MSG_RECONNECTING: &str = "Reconnecting to the cloud...";
const MSG_RECONNECTED: &str = "Cloud connection restored ✅";
const MSG_FETCH_FAILED: &str =
    "Cloud is unavailable; showing the local cache. Retry when you are ready.";
const MSG_SEED_FAILED: &str =
    "Cloud is empty and seeding it failed; retry later or check the configuration.";
const MSG_REFETCH_FAILED: &str = "Reloading after the initial seed failed; retry later.";
const MSG_ORDER_SYNCING: &str = "Syncing order...";
const MSG_ORDER_SYNCED: &str = "Order synced to the cloud";
const MSG_ORDER_FAILED: &str = "Order sync failed; the local order is kept. Retry later.";
const MSG_NO_PERMISSION: &str = "No permission to manage sites; sign in as an admin first.";

/// The core state machine.
///
/// Owns the in-memory collection and keeps it, the cache snapshot, and the
/// remote rows convergent: local mutations are mirrored to the cache, cloud
/// mutations are confirmed by a full refetch.
pub struct SyncEngine {
    collection: Vec<Category>,
    cache: CacheStore,
    gateway: Option<Arc<dyn Gateway>>,
    cloud_ready: bool,
    sync_state: SyncState,
    status: Option<StatusMessage>,
    access: AccessEvaluator,
    identity: Option<Identity>,
    active_category: Option<String>,
    editing_site: Option<String>,
    action_syncing: bool,
}

impl SyncEngine {
    /// Build the engine. The collection starts from the local cache (or the
    /// default catalog); when a gateway is supplied the caller follows up
    /// with [`SyncEngine::connect`] to hydrate from the remote.
    pub fn new(cache: CacheStore, gateway: Option<Arc<dyn Gateway>>) -> Self {
        let collection = cache.load();
        let remote_configured = gateway.is_some();
        let active_category = collection.first().map(|category| category.id.clone());
        Self {
            collection,
            cache,
            gateway,
            cloud_ready: false,
            sync_state: if remote_configured {
                SyncState::loading(MSG_CONNECTING)
            } else {
                SyncState::local()
            },
            status: None,
            access: AccessEvaluator::new(remote_configured),
            identity: None,
            active_category,
            editing_site: None,
            action_syncing: false,
        }
    }

    // --- Read surface ---

    pub fn collection(&self) -> &[Category] {
        &self.collection
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync_state
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn action_syncing(&self) -> bool {
        self.action_syncing
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True when a remote is configured, whether or not it is reachable.
    pub fn remote_configured(&self) -> bool {
        self.gateway.is_some()
    }

    /// True when the remote is configured and the last refresh succeeded.
    pub fn cloud_mode(&self) -> bool {
        self.gateway.is_some() && self.cloud_ready
    }

    pub fn can_manage(&self) -> bool {
        access::can_manage_sites(self.identity.as_ref(), self.remote_configured())
    }

    /// Displayable identity/status summary.
    pub fn identity_summary(&self) -> (String, Tone) {
        access::identity_summary(self.identity.as_ref(), self.remote_configured())
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn set_active_category(&mut self, category_id: impl Into<String>) {
        self.active_category = Some(category_id.into());
        self.ensure_active_category();
    }

    pub fn editing_site(&self) -> Option<&str> {
        self.editing_site.as_deref()
    }

    pub fn begin_edit(&mut self, site_id: impl Into<String>) {
        self.editing_site = Some(site_id.into());
    }

    pub fn clear_edit(&mut self) {
        self.editing_site = None;
    }

    /// Sites to display for `term`; see [`crate::search::displayed_sites`].
    pub fn displayed_sites(&self, term: &str) -> Vec<&Site> {
        search::displayed_sites(
            &self.collection,
            self.active_category.as_deref().unwrap_or_default(),
            term,
        )
    }

    pub fn theme(&self) -> Option<Theme> {
        self.cache.load_theme()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.cache.save_theme(theme);
    }

    // --- Session handling ---

    /// Apply a session result (from hydration, an auth-change callback, or
    /// sign-out). Returns the one-shot unlock event when the manage
    /// capability was just granted.
    pub fn apply_session(&mut self, identity: Option<Identity>) -> Option<AccessEvent> {
        self.identity = identity;
        let event = self.access.observe(self.identity.as_ref());
        if event.is_some() {
            info!("site management unlocked for {:?}", self.identity.as_ref().map(|i| i.email.as_str()));
            self.set_status("Admin verified; site management unlocked ✨", Tone::Success);
        }
        event
    }

    // --- Refresh / retry ---

    /// Initial remote hydration. No-op in local mode.
    pub async fn connect(&mut self) -> Result<(), SyncError> {
        self.refresh(MSG_CONNECTING, MSG_CONNECTED).await
    }

    /// Re-entry from the error state.
    pub async fn retry(&mut self) -> Result<(), SyncError> {
        self.refresh(MSG_RECONNECTING, MSG_RECONNECTED).await
    }

    /// Load the collection from the remote, seeding the default catalog
    /// first when the remote has no categories at all.
    ///
    /// On any failure the engine enters the error phase and the previous
    /// in-memory collection stays in place, so the caller keeps a usable
    /// (possibly stale) dataset.
    pub async fn refresh(
        &mut self,
        loading_message: &str,
        success_message: &str,
    ) -> Result<(), SyncError> {
        let Some(gateway) = self.gateway.clone() else {
            return Ok(());
        };
        self.sync_state = SyncState::loading(loading_message);
        match store::refresh_collection(gateway.as_ref()).await {
            Ok(collection) => {
                self.install(collection);
                self.cloud_ready = true;
                self.sync_state = SyncState::ready(success_message);
                Ok(())
            }
            Err(failure) => {
                self.cloud_ready = false;
                let banner = match &failure {
                    RefreshFailure::Fetch(err) => {
                        error!("failed to fetch remote data: {}", err);
                        MSG_FETCH_FAILED
                    }
                    RefreshFailure::Seed(err) => {
                        error!("failed to seed remote defaults: {}", err);
                        MSG_SEED_FAILED
                    }
                    RefreshFailure::Refetch(err) => {
                        error!("failed to refetch after seeding: {}", err);
                        MSG_REFETCH_FAILED
                    }
                };
                self.sync_state = SyncState::failed(banner);
                Err(failure.into())
            }
        }
    }

    // --- Mutations ---

    /// Create a site from the draft.
    pub async fn create_site(&mut self, draft: SiteDraft) -> Result<(), SyncError> {
        self.mutate(
            Mutation::Create { draft },
            "Saving the new site...",
            "Site added 💡",
        )
        .await?;
        self.clear_edit();
        Ok(())
    }

    /// Update an existing site, moving it between categories when the draft
    /// names a different one.
    pub async fn update_site(
        &mut self,
        site_id: impl Into<String>,
        source_category_id: impl Into<String>,
        draft: SiteDraft,
    ) -> Result<(), SyncError> {
        self.mutate(
            Mutation::Update {
                site_id: site_id.into(),
                source_category_id: source_category_id.into(),
                draft,
            },
            "Updating the site...",
            "Site updated ✅",
        )
        .await?;
        self.clear_edit();
        Ok(())
    }

    /// Delete a site. Clears the edit form when it held the deleted site.
    pub async fn delete_site(
        &mut self,
        category_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Result<(), SyncError> {
        let site_id = site_id.into();
        self.mutate(
            Mutation::Delete {
                category_id: category_id.into(),
                site_id: site_id.clone(),
            },
            "Deleting the site...",
            "Site deleted ✂️",
        )
        .await?;
        if self.editing_site.as_deref() == Some(site_id.as_str()) {
            self.clear_edit();
        }
        Ok(())
    }

    /// Destroy the current records and reinitialize from the default
    /// catalog. In cloud mode the remote sites are cleared and reseeded; in
    /// local mode the cache (snapshot and version marker) is wiped so the
    /// next cold load reseeds cleanly.
    pub async fn reset_defaults(&mut self) -> Result<(), SyncError> {
        self.ensure_can_manage()?;
        match self.mode() {
            OperatingMode::Cloud(gateway) => {
                self.begin_action("Restoring the default data...");
                let mut cloud = CloudStore::new(gateway, self.collection.clone());
                let result = cloud.apply(Mutation::ResetDefaults).await;
                self.finish_action(result, "Defaults restored ✨")?;
            }
            OperatingMode::Local => {
                let mut local = LocalStore::new(self.collection.clone());
                let collection = local.apply(Mutation::ResetDefaults).await?;
                self.collection = collection;
                self.cache.clear();
                self.ensure_active_category();
                self.set_status("Defaults restored ✨", Tone::Success);
            }
        }
        self.clear_edit();
        self.active_category = self.collection.first().map(|category| category.id.clone());
        Ok(())
    }

    /// Move `dragged_id` onto `target_id`'s position within a category and
    /// renumber. Equal or unknown ids are a no-op. In cloud mode the new
    /// ranks are pushed after the local reflection; a failed push keeps the
    /// local order and degrades the sync banner instead of reverting.
    pub async fn reorder_site(
        &mut self,
        category_id: &str,
        dragged_id: &str,
        target_id: &str,
    ) -> Result<(), SyncError> {
        self.ensure_can_manage()?;
        let mut next = self.collection.clone();
        if !store::apply_reorder(&mut next, category_id, dragged_id, target_id) {
            return Ok(());
        }
        self.install(next);

        if let OperatingMode::Cloud(gateway) = self.mode() {
            self.sync_state = SyncState::loading(MSG_ORDER_SYNCING);
            let ranks: Vec<SiteOrderRow> = self
                .collection
                .iter()
                .find(|category| category.id == category_id)
                .map(|category| {
                    category
                        .sites
                        .iter()
                        .map(|site| SiteOrderRow {
                            id: site.id.clone(),
                            sort_order: site.sort_order,
                        })
                        .collect()
                })
                .unwrap_or_default();
            if let Err(err) = gateway.upsert_site_order(&ranks).await {
                error!("failed to push site order: {}", err);
                self.sync_state = SyncState::failed(MSG_ORDER_FAILED);
                return Err(err.into());
            }
            self.sync_state = SyncState::ready(MSG_ORDER_SYNCED);
        }
        Ok(())
    }

    // --- Internals ---

    /// Permission gate shared by every mutation entry point. Rejections
    /// surface a status message and change nothing.
    fn ensure_can_manage(&mut self) -> Result<(), SyncError> {
        if self.can_manage() {
            return Ok(());
        }
        self.set_status(MSG_NO_PERMISSION, Tone::Error);
        Err(SyncError::PermissionDenied)
    }

    /// Resolve the operating mode once for the current operation.
    fn mode(&self) -> OperatingMode {
        match (&self.gateway, self.cloud_ready) {
            (Some(gateway), true) => OperatingMode::Cloud(gateway.clone()),
            _ => OperatingMode::Local,
        }
    }

    /// Dispatch a create/update/delete through the store for the current
    /// mode and install the collection it returns.
    async fn mutate(
        &mut self,
        mutation: Mutation,
        progress: &str,
        done: &str,
    ) -> Result<(), SyncError> {
        self.ensure_can_manage()?;
        // Validation failures are rejected here, before any side effect or
        // state transition.
        if let Mutation::Create { draft } | Mutation::Update { draft, .. } = &mutation {
            if let Err(err) = draft.validate() {
                self.set_status(err.to_string(), Tone::Error);
                return Err(err.into());
            }
        }
        match self.mode() {
            OperatingMode::Cloud(gateway) => {
                self.begin_action(progress);
                let mut cloud = CloudStore::new(gateway, self.collection.clone());
                let result = cloud.apply(mutation).await;
                self.finish_action(result, done)?;
            }
            OperatingMode::Local => {
                let mut local = LocalStore::new(self.collection.clone());
                match local.apply(mutation).await {
                    Ok(collection) => {
                        self.install(collection);
                        self.set_status(done, Tone::Success);
                    }
                    Err(err) => {
                        self.set_status(err.to_string(), Tone::Error);
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    fn begin_action(&mut self, progress: &str) {
        self.action_syncing = true;
        self.set_status(progress, Tone::Info);
        self.sync_state = SyncState::loading(MSG_REFRESHING);
    }

    /// Land a cloud store result: install and go ready on success, keep the
    /// prior collection and report on failure. Clears the single-flight
    /// flag either way.
    fn finish_action(
        &mut self,
        result: Result<Vec<Category>, SyncError>,
        done: &str,
    ) -> Result<(), SyncError> {
        self.action_syncing = false;
        match result {
            Ok(collection) => {
                self.install(collection);
                self.cloud_ready = true;
                self.sync_state = SyncState::ready("Cloud data is ready ✅");
                self.set_status(done, Tone::Success);
                Ok(())
            }
            Err(err) => {
                error!("cloud operation failed: {}", err);
                self.sync_state = SyncState::failed(MSG_FETCH_FAILED);
                self.set_status(format!("Cloud operation failed: {err}"), Tone::Error);
                Err(err)
            }
        }
    }

    /// Replace the in-memory collection, keep the active category valid,
    /// and mirror the snapshot into the cache.
    fn install(&mut self, collection: Vec<Category>) {
        self.collection = collection;
        self.ensure_active_category();
        self.cache.save(&self.collection);
    }

    fn ensure_active_category(&mut self) {
        let valid = self
            .active_category
            .as_deref()
            .map(|active| self.collection.iter().any(|category| category.id == active))
            .unwrap_or(false);
        if !valid {
            self.active_category = self.collection.first().map(|category| category.id.clone());
        }
    }

    fn set_status(&mut self, text: impl Into<String>, tone: Tone) {
        self.status = Some(StatusMessage {
            text: text.into(),
            tone,
        });
    }
}
