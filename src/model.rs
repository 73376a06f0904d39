//! Core domain types: categories, sites, and the site edit draft.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emoji used for sites that were saved without one.
pub const DEFAULT_SITE_EMOJI: &str = "🔗";

/// Emoji used for categories that were saved without one.
pub const DEFAULT_CATEGORY_EMOJI: &str = "📁";

/// Placeholder shown when a site has no keyboard shortcut.
pub const DEFAULT_SHORTCUT: &str = "-";

/// A named group of sites with display metadata and an ordering rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub emoji: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl Category {
    /// Find a site's position within this category.
    pub fn site_index(&self, site_id: &str) -> Option<usize> {
        self.sites.iter().position(|site| site.id == site_id)
    }
}

/// A single bookmarked link.
///
/// `category_id` is a relation back to the owning [`Category`]; the site is
/// always looked up through the category list, never the other way around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_shortcut")]
    pub shortcut: String,
    #[serde(default = "default_site_emoji")]
    pub emoji: String,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_shortcut() -> String {
    DEFAULT_SHORTCUT.to_string()
}

fn default_site_emoji() -> String {
    DEFAULT_SITE_EMOJI.to_string()
}

/// Display tone for status lines surfaced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Error,
    Info,
}

/// Free-text form input for creating or editing a site.
///
/// Field contents arrive exactly as typed; [`SiteDraft::validate`] produces
/// the cleaned-up values that actually enter the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteDraft {
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub tags_text: String,
    pub shortcut: String,
    pub emoji: String,
}

/// Validation failure for a [`SiteDraft`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    #[error("site name is required")]
    MissingName,
    #[error("site url is required")]
    MissingUrl,
}

/// Cleaned-up draft fields ready to be written into the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteFields {
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub shortcut: String,
    pub emoji: String,
}

impl SiteDraft {
    /// Validate and normalize the draft.
    ///
    /// `name` and `url` must be non-empty after trimming. Tags are split out
    /// of the free-text field, a blank shortcut becomes `"-"`, and a blank
    /// emoji falls back to the generic link glyph.
    pub fn validate(&self) -> Result<SiteFields, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Err(DraftError::MissingUrl);
        }
        let shortcut = self.shortcut.trim();
        let emoji = self.emoji.trim();
        Ok(SiteFields {
            category_id: self.category_id.clone(),
            name: name.to_string(),
            description: self.description.trim().to_string(),
            url: url.to_string(),
            tags: parse_tags(&self.tags_text),
            shortcut: if shortcut.is_empty() {
                DEFAULT_SHORTCUT.to_string()
            } else {
                shortcut.to_string()
            },
            emoji: if emoji.is_empty() {
                DEFAULT_SITE_EMOJI.to_string()
            } else {
                emoji.to_string()
            },
        })
    }
}

/// Split free-text tag input on whitespace and the comma family, dropping
/// empties. `"rust, ai ，tools"` becomes `["rust", "ai", "tools"]`.
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | '，' | '、'))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate a collision-resistant site id from a time component and a random
/// component, e.g. `site_lx2c91a4f3b`.
pub fn generate_site_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random = Uuid::new_v4().simple().to_string();
    format!("site_{}{}", to_base36(millis), &random[..4])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

/// Reassign `sort_order` as a dense zero-based ranking in list order.
pub fn renumber(sites: &mut [Site]) {
    for (index, site) in sites.iter_mut().enumerate() {
        site.sort_order = index as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_splits_on_whitespace_and_comma_family() {
        assert_eq!(
            parse_tags("rust, ai ，tools、web\nsearch"),
            vec!["rust", "ai", "tools", "web", "search"]
        );
    }

    #[test]
    fn parse_tags_drops_empties() {
        assert_eq!(parse_tags("  , ,， 、 "), Vec::<String>::new());
        assert_eq!(parse_tags(""), Vec::<String>::new());
    }

    #[test]
    fn draft_requires_name_and_url() {
        let mut draft = SiteDraft {
            category_id: "learn".into(),
            name: "   ".into(),
            url: "https://example.com".into(),
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(DraftError::MissingName));

        draft.name = "Example".into();
        draft.url = " ".into();
        assert_eq!(draft.validate(), Err(DraftError::MissingUrl));
    }

    #[test]
    fn draft_defaults_shortcut_and_emoji() {
        let draft = SiteDraft {
            category_id: "learn".into(),
            name: " Example ".into(),
            url: " https://example.com ".into(),
            tags_text: "a b".into(),
            ..Default::default()
        };
        let fields = draft.validate().unwrap();
        assert_eq!(fields.name, "Example");
        assert_eq!(fields.url, "https://example.com");
        assert_eq!(fields.shortcut, DEFAULT_SHORTCUT);
        assert_eq!(fields.emoji, DEFAULT_SITE_EMOJI);
        assert_eq!(fields.tags, vec!["a", "b"]);
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = generate_site_id();
        let b = generate_site_id();
        assert!(a.starts_with("site_"));
        assert_ne!(a, b);
    }

    #[test]
    fn renumber_assigns_dense_ranks() {
        let mut sites = vec![
            site("a", 7),
            site("b", 3),
            site("c", 9),
        ];
        renumber(&mut sites);
        let ranks: Vec<i32> = sites.iter().map(|s| s.sort_order).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    fn site(id: &str, sort_order: i32) -> Site {
        Site {
            id: id.to_string(),
            category_id: "cat".to_string(),
            name: id.to_string(),
            description: String::new(),
            url: format!("https://{id}.example"),
            tags: vec![],
            shortcut: DEFAULT_SHORTCUT.to_string(),
            emoji: DEFAULT_SITE_EMOJI.to_string(),
            sort_order,
        }
    }
}
