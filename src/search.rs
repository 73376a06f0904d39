//! Search projection over the collection.

use crate::model::{Category, Site};

/// Result cap for the inline search view. The full panel is uncapped.
pub const INLINE_RESULT_CAP: usize = 18;

/// Sites to display for a search term.
///
/// An empty (or whitespace-only) term yields the active category's sites in
/// stored order. Otherwise every site across all categories whose name,
/// description, or any tag contains the term case-insensitively matches,
/// capped at [`INLINE_RESULT_CAP`].
pub fn displayed_sites<'a>(
    categories: &'a [Category],
    active_category: &str,
    term: &str,
) -> Vec<&'a Site> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return categories
            .iter()
            .find(|category| category.id == active_category)
            .map(|category| category.sites.iter().collect())
            .unwrap_or_default();
    }
    search_all(categories, &term)
        .into_iter()
        .take(INLINE_RESULT_CAP)
        .collect()
}

/// Uncapped search across all categories for the full panel. `term` is
/// matched case-insensitively; pass it as typed.
pub fn search_all<'a>(categories: &'a [Category], term: &str) -> Vec<&'a Site> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    categories
        .iter()
        .flat_map(|category| category.sites.iter())
        .filter(|site| matches(site, &term))
        .collect()
}

fn matches(site: &Site, term: &str) -> bool {
    site.name.to_lowercase().contains(term)
        || site.description.to_lowercase().contains(term)
        || site.tags.iter().any(|tag| tag.to_lowercase().contains(term))
}
