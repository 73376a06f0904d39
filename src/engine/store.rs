//! Mode-dispatched mutation stores: one contract, a local and a cloud
//! implementation.

use super::{RefreshFailure, SyncError};
use crate::catalog;
use crate::gateway::{Gateway, SitePatch, SiteRow, Snapshot};
use crate::model::{
    self, generate_site_id, Category, Site, SiteDraft, SiteFields, DEFAULT_CATEGORY_EMOJI,
    DEFAULT_SHORTCUT, DEFAULT_SITE_EMOJI,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A single user intent against the collection.
///
/// Reordering is not represented here: its cloud path reflects locally first
/// and pushes ranks without a refresh, so the engine dispatches it directly.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create {
        draft: SiteDraft,
    },
    Update {
        site_id: String,
        source_category_id: String,
        draft: SiteDraft,
    },
    Delete {
        category_id: String,
        site_id: String,
    },
    ResetDefaults,
}

/// The shared store contract: apply a mutation, return the collection both
/// sides now agree on.
#[async_trait]
pub trait MutationStore {
    async fn apply(&mut self, mutation: Mutation) -> Result<Vec<Category>, SyncError>;
}

/// Local-only implementation: mutates an owned copy of the collection with
/// the in-memory rules. The engine installs the returned collection and
/// mirrors it to the cache.
pub struct LocalStore {
    collection: Vec<Category>,
}

impl LocalStore {
    pub fn new(collection: Vec<Category>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl MutationStore for LocalStore {
    async fn apply(&mut self, mutation: Mutation) -> Result<Vec<Category>, SyncError> {
        match mutation {
            Mutation::Create { draft } => {
                let fields = draft.validate()?;
                apply_create(&mut self.collection, fields, generate_site_id())?;
            }
            Mutation::Update {
                site_id,
                source_category_id,
                draft,
            } => {
                let fields = draft.validate()?;
                apply_update(&mut self.collection, &site_id, &source_category_id, fields)?;
            }
            Mutation::Delete {
                category_id,
                site_id,
            } => {
                apply_delete(&mut self.collection, &category_id, &site_id);
            }
            Mutation::ResetDefaults => {
                self.collection = catalog::default_categories();
            }
        }
        Ok(self.collection.clone())
    }
}

/// Cloud implementation: issues the gateway call, then refetches the whole
/// collection so convergence never depends on a hand-patched guess.
pub struct CloudStore {
    gateway: Arc<dyn Gateway>,
    collection: Vec<Category>,
}

impl CloudStore {
    pub fn new(gateway: Arc<dyn Gateway>, collection: Vec<Category>) -> Self {
        Self {
            gateway,
            collection,
        }
    }
}

#[async_trait]
impl MutationStore for CloudStore {
    async fn apply(&mut self, mutation: Mutation) -> Result<Vec<Category>, SyncError> {
        match mutation {
            Mutation::Create { draft } => {
                let fields = draft.validate()?;
                // A new site lands at the end of its category.
                let rank = self
                    .collection
                    .iter()
                    .find(|category| category.id == fields.category_id)
                    .map(|category| category.sites.len())
                    .unwrap_or(0) as i32;
                let row = site_row(generate_site_id(), &fields, rank);
                self.gateway.insert_sites(&[row]).await?;
            }
            Mutation::Update { site_id, draft, .. } => {
                let fields = draft.validate()?;
                self.gateway.update_site(&site_id, &patch(&fields)).await?;
            }
            Mutation::Delete { site_id, .. } => {
                self.gateway.delete_site(&site_id).await?;
            }
            Mutation::ResetDefaults => {
                // Delete-all-then-seed: clearing first keeps the site insert
                // from tripping over leftover custom ids.
                self.gateway.delete_all_sites().await?;
                let (category_rows, site_rows) = catalog::seed_rows();
                self.gateway.upsert_categories(&category_rows).await?;
                self.gateway.insert_sites(&site_rows).await?;
            }
        }
        refresh_collection(self.gateway.as_ref())
            .await
            .map_err(SyncError::from)
    }
}

fn site_row(id: String, fields: &SiteFields, rank: i32) -> SiteRow {
    SiteRow {
        id,
        category_id: fields.category_id.clone(),
        name: fields.name.clone(),
        description: Some(fields.description.clone()),
        url: fields.url.clone(),
        tags: Some(fields.tags.clone()),
        shortcut: Some(fields.shortcut.clone()),
        emoji: Some(fields.emoji.clone()),
        sort_order: Some(rank),
    }
}

fn patch(fields: &SiteFields) -> SitePatch {
    SitePatch {
        category_id: fields.category_id.clone(),
        name: fields.name.clone(),
        description: fields.description.clone(),
        url: fields.url.clone(),
        tags: fields.tags.clone(),
        shortcut: fields.shortcut.clone(),
        emoji: fields.emoji.clone(),
    }
}

/// Full remote load: fetch, seed-then-refetch when the remote is empty,
/// normalize into the in-memory shape.
pub(crate) async fn refresh_collection(
    gateway: &dyn Gateway,
) -> Result<Vec<Category>, RefreshFailure> {
    let snapshot = gateway.fetch_all().await.map_err(RefreshFailure::Fetch)?;
    if !snapshot.categories.is_empty() {
        return Ok(normalize(snapshot));
    }

    // Empty remote: push the default catalog, then load what stuck. The
    // category upsert is keyed by id, so repeating it is harmless; the site
    // insert is only safe here because the remote was just confirmed empty.
    let (category_rows, site_rows) = catalog::seed_rows();
    gateway
        .upsert_categories(&category_rows)
        .await
        .map_err(RefreshFailure::Seed)?;
    gateway
        .insert_sites(&site_rows)
        .await
        .map_err(RefreshFailure::Seed)?;

    let snapshot = gateway.fetch_all().await.map_err(RefreshFailure::Refetch)?;
    Ok(normalize(snapshot))
}

/// Shape fetched rows into the category list: safe fallbacks for optional
/// display fields, orphaned sites dropped, sites ordered by rank.
pub(crate) fn normalize(snapshot: Snapshot) -> Vec<Category> {
    let mut categories: Vec<Category> = snapshot
        .categories
        .into_iter()
        .enumerate()
        .map(|(index, row)| Category {
            id: row.id,
            label: row.label,
            emoji: row
                .emoji
                .unwrap_or_else(|| DEFAULT_CATEGORY_EMOJI.to_string()),
            description: row.description.unwrap_or_default(),
            sort_order: row.sort_order.unwrap_or(index as i32),
            sites: Vec::new(),
        })
        .collect();

    for (index, row) in snapshot.sites.into_iter().enumerate() {
        let Some(category) = categories
            .iter_mut()
            .find(|category| category.id == row.category_id)
        else {
            // A site without its category has nowhere to hang; skip it.
            debug!(
                "dropping site {:?} referencing unknown category {:?}",
                row.id, row.category_id
            );
            continue;
        };
        category.sites.push(Site {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            url: row.url,
            tags: row.tags.unwrap_or_default(),
            shortcut: row.shortcut.unwrap_or_else(|| DEFAULT_SHORTCUT.to_string()),
            emoji: row.emoji.unwrap_or_else(|| DEFAULT_SITE_EMOJI.to_string()),
            sort_order: row.sort_order.unwrap_or(index as i32),
        });
    }

    for category in &mut categories {
        category.sites.sort_by_key(|site| site.sort_order);
    }
    categories
}

pub(crate) fn apply_create(
    collection: &mut [Category],
    fields: SiteFields,
    site_id: String,
) -> Result<(), SyncError> {
    let category = collection
        .iter_mut()
        .find(|category| category.id == fields.category_id)
        .ok_or_else(|| SyncError::UnknownCategory(fields.category_id.clone()))?;
    category.sites.push(Site {
        id: site_id,
        category_id: fields.category_id,
        name: fields.name,
        description: fields.description,
        url: fields.url,
        tags: fields.tags,
        shortcut: fields.shortcut,
        emoji: fields.emoji,
        sort_order: 0,
    });
    model::renumber(&mut category.sites);
    Ok(())
}

pub(crate) fn apply_update(
    collection: &mut [Category],
    site_id: &str,
    source_category_id: &str,
    fields: SiteFields,
) -> Result<(), SyncError> {
    // Pull the site out of its source category, remembering where it sat.
    let mut previous_index = None;
    if let Some(source) = collection
        .iter_mut()
        .find(|category| category.id == source_category_id)
    {
        if let Some(index) = source.site_index(site_id) {
            previous_index = Some(index);
            source.sites.remove(index);
            model::renumber(&mut source.sites);
        }
    }

    let target = collection
        .iter_mut()
        .find(|category| category.id == fields.category_id)
        .ok_or_else(|| SyncError::UnknownCategory(fields.category_id.clone()))?;

    // Same-category edits keep their slot (clamped); cross-category moves
    // append at the end.
    let insert_index = match previous_index {
        Some(index) if source_category_id == fields.category_id => {
            index.min(target.sites.len())
        }
        _ => target.sites.len(),
    };
    target.sites.insert(
        insert_index,
        Site {
            id: site_id.to_string(),
            category_id: fields.category_id,
            name: fields.name,
            description: fields.description,
            url: fields.url,
            tags: fields.tags,
            shortcut: fields.shortcut,
            emoji: fields.emoji,
            sort_order: 0,
        },
    );
    model::renumber(&mut target.sites);
    Ok(())
}

pub(crate) fn apply_delete(collection: &mut [Category], category_id: &str, site_id: &str) {
    if let Some(category) = collection
        .iter_mut()
        .find(|category| category.id == category_id)
    {
        category.sites.retain(|site| site.id != site_id);
        model::renumber(&mut category.sites);
    }
}

/// Array-move of `dragged_id` onto `target_id`'s position within one
/// category, then renumber. Returns false (leaving the collection
/// untouched) when the ids are equal or either is missing.
pub(crate) fn apply_reorder(
    collection: &mut [Category],
    category_id: &str,
    dragged_id: &str,
    target_id: &str,
) -> bool {
    if dragged_id == target_id {
        return false;
    }
    let Some(category) = collection
        .iter_mut()
        .find(|category| category.id == category_id)
    else {
        return false;
    };
    let (Some(from), Some(to)) = (
        category.site_index(dragged_id),
        category.site_index(target_id),
    ) else {
        return false;
    };
    let site = category.sites.remove(from);
    category.sites.insert(to, site);
    model::renumber(&mut category.sites);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_categories;

    fn fields(category_id: &str, name: &str) -> SiteFields {
        SiteFields {
            category_id: category_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            url: format!("https://{name}.example"),
            tags: vec![],
            shortcut: DEFAULT_SHORTCUT.to_string(),
            emoji: DEFAULT_SITE_EMOJI.to_string(),
        }
    }

    #[test]
    fn create_appends_and_renumbers() {
        let mut collection = default_categories();
        let before = collection[0].sites.len();
        apply_create(&mut collection, fields("learn", "new"), "s_new".into()).unwrap();
        let sites = &collection[0].sites;
        assert_eq!(sites.len(), before + 1);
        assert_eq!(sites.last().unwrap().id, "s_new");
        assert_eq!(sites.last().unwrap().sort_order, before as i32);
    }

    #[test]
    fn create_rejects_unknown_category() {
        let mut collection = default_categories();
        let err = apply_create(&mut collection, fields("nope", "x"), "s".into()).unwrap_err();
        assert!(matches!(err, SyncError::UnknownCategory(_)));
    }

    #[test]
    fn same_category_update_preserves_position() {
        let mut collection = default_categories();
        let target = collection[0].sites[1].id.clone();
        apply_update(&mut collection, &target, "learn", fields("learn", "renamed")).unwrap();
        assert_eq!(collection[0].sites[1].id, target);
        assert_eq!(collection[0].sites[1].name, "renamed");
        let ranks: Vec<i32> = collection[0].sites.iter().map(|s| s.sort_order).collect();
        assert_eq!(ranks, (0..ranks.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn cross_category_update_appends_to_target() {
        let mut collection = default_categories();
        let moving = collection[0].sites[0].id.clone();
        apply_update(&mut collection, &moving, "learn", fields("team", "moved")).unwrap();
        assert!(collection[0].site_index(&moving).is_none());
        let team = collection.iter().find(|c| c.id == "team").unwrap();
        assert_eq!(team.sites.last().unwrap().id, moving);
        assert_eq!(team.sites.last().unwrap().category_id, "team");
    }

    #[test]
    fn delete_is_lenient_and_renumbers() {
        let mut collection = default_categories();
        let victim = collection[0].sites[0].id.clone();
        apply_delete(&mut collection, "learn", &victim);
        assert!(collection[0].site_index(&victim).is_none());
        assert_eq!(collection[0].sites[0].sort_order, 0);

        // Unknown ids are a no-op, not an error.
        apply_delete(&mut collection, "learn", "missing");
        apply_delete(&mut collection, "missing", &victim);
    }

    #[test]
    fn reorder_moves_dragged_onto_target() {
        let mut collection = default_categories();
        let ids: Vec<String> = collection[0].sites.iter().map(|s| s.id.clone()).collect();
        // Drag the third site onto the first position.
        assert!(apply_reorder(&mut collection, "learn", &ids[2], &ids[0]));
        let after: Vec<&str> = collection[0]
            .sites
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(after[0], ids[2]);
        assert_eq!(after[1], ids[0]);
        assert_eq!(after[2], ids[1]);
        let ranks: Vec<i32> = collection[0].sites.iter().map(|s| s.sort_order).collect();
        assert_eq!(ranks, (0..ranks.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn reorder_noops_on_equal_or_unknown_ids() {
        let mut collection = default_categories();
        let snapshot = collection.clone();
        let first = collection[0].sites[0].id.clone();
        assert!(!apply_reorder(&mut collection, "learn", &first, &first));
        assert!(!apply_reorder(&mut collection, "learn", &first, "missing"));
        assert!(!apply_reorder(&mut collection, "missing", &first, &first));
        assert_eq!(collection, snapshot);
    }

    #[test]
    fn normalize_drops_orphans_and_sorts() {
        use crate::gateway::{CategoryRow, SiteRow};
        let snapshot = Snapshot {
            categories: vec![CategoryRow {
                id: "cat".into(),
                label: "Cat".into(),
                description: None,
                emoji: None,
                sort_order: Some(0),
            }],
            sites: vec![
                SiteRow {
                    id: "late".into(),
                    category_id: "cat".into(),
                    name: "Late".into(),
                    description: None,
                    url: "https://late.example".into(),
                    tags: None,
                    shortcut: None,
                    emoji: None,
                    sort_order: Some(5),
                },
                SiteRow {
                    id: "orphan".into(),
                    category_id: "ghost".into(),
                    name: "Orphan".into(),
                    description: None,
                    url: "https://orphan.example".into(),
                    tags: None,
                    shortcut: None,
                    emoji: None,
                    sort_order: Some(0),
                },
                SiteRow {
                    id: "early".into(),
                    category_id: "cat".into(),
                    name: "Early".into(),
                    description: None,
                    url: "https://early.example".into(),
                    tags: None,
                    shortcut: None,
                    emoji: None,
                    sort_order: Some(1),
                },
            ],
        };
        let categories = normalize(snapshot);
        assert_eq!(categories.len(), 1);
        let ids: Vec<&str> = categories[0].sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(categories[0].emoji, DEFAULT_CATEGORY_EMOJI);
        assert_eq!(categories[0].sites[0].shortcut, DEFAULT_SHORTCUT);
    }
}
