//! The default catalog: fixed seed data used for first runs, resets, and
//! remote seeding.

use crate::gateway::{CategoryRow, SiteRow};
use crate::model::{Category, Site, DEFAULT_SHORTCUT};

struct SeedSite {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    url: &'static str,
    tags: &'static [&'static str],
    shortcut: &'static str,
    emoji: &'static str,
}

struct SeedCategory {
    id: &'static str,
    label: &'static str,
    emoji: &'static str,
    description: &'static str,
    sites: &'static [SeedSite],
}

const SEED: &[SeedCategory] = &[
    SeedCategory {
        id: "learn",
        label: "Learning",
        emoji: "📚",
        description: "Courses, problem sets, and study tools",
        sites: &[
            SeedSite {
                id: "coursera",
                name: "Coursera",
                description: "University courses and certificates",
                url: "https://www.coursera.org",
                tags: &["courses", "certificates"],
                shortcut: "Shift+1",
                emoji: "🎯",
            },
            SeedSite {
                id: "leetcode",
                name: "LeetCode",
                description: "Algorithm problems and contests",
                url: "https://leetcode.com",
                tags: &["algorithms", "contests"],
                shortcut: "Shift+2",
                emoji: "🧠",
            },
            SeedSite {
                id: "rsch",
                name: "ResearchRabbit",
                description: "Literature discovery and mapping",
                url: "https://www.researchrabbit.ai",
                tags: &["papers", "AI"],
                shortcut: "Shift+3",
                emoji: "🔬",
            },
            SeedSite {
                id: "mdn",
                name: "MDN Web Docs",
                description: "Reference for the open web platform",
                url: "https://developer.mozilla.org",
                tags: &["reference", "web"],
                shortcut: "Shift+4",
                emoji: "🧩",
            },
            SeedSite {
                id: "anki",
                name: "AnkiWeb",
                description: "Spaced-repetition decks in the cloud",
                url: "https://ankiweb.net",
                tags: &["memory", "cloud"],
                shortcut: "Shift+5",
                emoji: "📝",
            },
        ],
    },
    SeedCategory {
        id: "create",
        label: "Creating",
        emoji: "🎨",
        description: "Writing, assets, and publishing platforms",
        sites: &[
            SeedSite {
                id: "figma",
                name: "Figma",
                description: "Collaborative interface design",
                url: "https://www.figma.com",
                tags: &["design", "collaboration"],
                shortcut: "Ctrl+1",
                emoji: "✨",
            },
            SeedSite {
                id: "pixabay",
                name: "Pixabay",
                description: "Royalty-free images and video",
                url: "https://pixabay.com",
                tags: &["assets", "images"],
                shortcut: "Ctrl+2",
                emoji: "🌈",
            },
            SeedSite {
                id: "ideogram",
                name: "Ideogram",
                description: "Text-to-image generation",
                url: "https://ideogram.ai",
                tags: &["images", "AI"],
                shortcut: "Ctrl+3",
                emoji: "🪄",
            },
            SeedSite {
                id: "canva",
                name: "Canva",
                description: "Quick visual templates",
                url: "https://www.canva.com",
                tags: &["templates", "visual"],
                shortcut: "Ctrl+4",
                emoji: "🎞️",
            },
            SeedSite {
                id: "ghost",
                name: "Ghost",
                description: "Newsletter and blog publishing",
                url: "https://ghost.org",
                tags: &["publishing", "blog"],
                shortcut: "Ctrl+5",
                emoji: "🛰️",
            },
        ],
    },
    SeedCategory {
        id: "team",
        label: "Teamwork",
        emoji: "🤝",
        description: "Internal systems, meetings, and docs",
        sites: &[
            SeedSite {
                id: "slack",
                name: "Slack",
                description: "Messaging and huddles",
                url: "https://slack.com",
                tags: &["meetings", "chat"],
                shortcut: "Alt+1",
                emoji: "💬",
            },
            SeedSite {
                id: "jira",
                name: "Jira",
                description: "Issues and board management",
                url: "https://www.atlassian.com/software/jira",
                tags: &["issues", "planning"],
                shortcut: "Alt+2",
                emoji: "📋",
            },
            SeedSite {
                id: "notion",
                name: "Notion Workspace",
                description: "Team knowledge base",
                url: "https://www.notion.so",
                tags: &["wiki", "collaboration"],
                shortcut: "Alt+3",
                emoji: "📚",
            },
            SeedSite {
                id: "airtable",
                name: "Airtable",
                description: "Data-driven workflows",
                url: "https://www.airtable.com",
                tags: &["tables", "automation"],
                shortcut: "Alt+4",
                emoji: "🧾",
            },
            SeedSite {
                id: "miro",
                name: "Miro",
                description: "Whiteboards and workshops",
                url: "https://miro.com",
                tags: &["whiteboard", "brainstorm"],
                shortcut: "Alt+5",
                emoji: "🧠",
            },
        ],
    },
];

/// Build a fresh copy of the default collection.
///
/// `sort_order` values are stamped from the fixed seed positions and are
/// never recomputed afterwards.
pub fn default_categories() -> Vec<Category> {
    SEED.iter()
        .enumerate()
        .map(|(category_index, category)| Category {
            id: category.id.to_string(),
            label: category.label.to_string(),
            emoji: category.emoji.to_string(),
            description: category.description.to_string(),
            sort_order: category_index as i32,
            sites: category
                .sites
                .iter()
                .enumerate()
                .map(|(site_index, site)| Site {
                    id: site.id.to_string(),
                    category_id: category.id.to_string(),
                    name: site.name.to_string(),
                    description: site.description.to_string(),
                    url: site.url.to_string(),
                    tags: site.tags.iter().map(|t| t.to_string()).collect(),
                    shortcut: if site.shortcut.is_empty() {
                        DEFAULT_SHORTCUT.to_string()
                    } else {
                        site.shortcut.to_string()
                    },
                    emoji: site.emoji.to_string(),
                    sort_order: site_index as i32,
                })
                .collect(),
        })
        .collect()
}

/// Build the remote seeding payload: one row per category and site, ranks
/// taken from seed positions.
pub fn seed_rows() -> (Vec<CategoryRow>, Vec<SiteRow>) {
    let categories = default_categories();
    let category_rows = categories
        .iter()
        .map(|category| CategoryRow {
            id: category.id.clone(),
            label: category.label.clone(),
            description: Some(category.description.clone()),
            emoji: Some(category.emoji.clone()),
            sort_order: Some(category.sort_order),
        })
        .collect();
    let site_rows = categories
        .iter()
        .flat_map(|category| category.sites.iter())
        .map(|site| SiteRow {
            id: site.id.clone(),
            category_id: site.category_id.clone(),
            name: site.name.clone(),
            description: Some(site.description.clone()),
            url: site.url.clone(),
            tags: Some(site.tags.clone()),
            shortcut: Some(site.shortcut.clone()),
            emoji: Some(site.emoji.clone()),
            sort_order: Some(site.sort_order),
        })
        .collect();
    (category_rows, site_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_catalog_has_dense_ranks() {
        let categories = default_categories();
        assert!(!categories.is_empty());
        for (index, category) in categories.iter().enumerate() {
            assert_eq!(category.sort_order, index as i32);
            for (site_index, site) in category.sites.iter().enumerate() {
                assert_eq!(site.sort_order, site_index as i32);
                assert_eq!(site.category_id, category.id);
            }
        }
    }

    #[test]
    fn default_catalog_ids_are_unique() {
        let categories = default_categories();
        let mut category_ids = HashSet::new();
        let mut site_ids = HashSet::new();
        for category in &categories {
            assert!(category_ids.insert(category.id.clone()));
            for site in &category.sites {
                assert!(site_ids.insert(site.id.clone()), "duplicate {}", site.id);
            }
        }
    }

    #[test]
    fn seed_rows_cover_every_site() {
        let categories = default_categories();
        let site_count: usize = categories.iter().map(|c| c.sites.len()).sum();
        let (category_rows, site_rows) = seed_rows();
        assert_eq!(category_rows.len(), categories.len());
        assert_eq!(site_rows.len(), site_count);
        assert_eq!(category_rows[0].sort_order, Some(0));
    }
}
