//! Access control: role collection, the admin gate, and the one-shot
//! unlock event consumed by the presentation layer.

use crate::model::Tone;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// The single elevated role token required to mutate data in cloud mode.
pub const ADMIN_ROLE: &str = "admin";

/// An authenticated identity as reported by the auth backend.
///
/// Both metadata namespaces are kept as raw JSON: role claims may be absent
/// or malformed and are tolerated as empty by [`collect_roles`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Gather role-like strings from a metadata namespace.
///
/// Reads the `role` key (string) and the `roles` key (array of strings),
/// trimming and deduplicating. Any other shape contributes nothing.
pub fn collect_roles(metadata: &Value) -> BTreeSet<String> {
    let mut roles = BTreeSet::new();
    let mut add = |value: &Value| {
        if let Some(role) = value.as_str() {
            let role = role.trim();
            if !role.is_empty() {
                roles.insert(role.to_string());
            }
        }
    };
    add(&metadata["role"]);
    if let Some(list) = metadata["roles"].as_array() {
        for value in list {
            add(value);
        }
    }
    roles
}

/// True iff an identity exists and carries the exact `admin` token in either
/// metadata namespace.
pub fn is_admin(identity: Option<&Identity>) -> bool {
    let Some(identity) = identity else {
        return false;
    };
    collect_roles(&identity.app_metadata)
        .union(&collect_roles(&identity.user_metadata))
        .any(|role| role == ADMIN_ROLE)
}

/// Whether site management is permitted.
///
/// Always true when no remote backend is configured (pure local mode);
/// otherwise requires the admin role. Non-admin and signed-out users may
/// view but not mutate.
pub fn can_manage_sites(identity: Option<&Identity>, remote_configured: bool) -> bool {
    !remote_configured || is_admin(identity)
}

/// Event emitted when the manage capability transitions from denied to
/// granted. One-shot per transition, not a polled state: the presentation
/// layer uses it to close a pending auth prompt exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessEvent {
    ManageUnlocked,
}

/// Tracks the manage capability across identity changes and emits
/// [`AccessEvent::ManageUnlocked`] on each `false → true` edge.
#[derive(Debug)]
pub struct AccessEvaluator {
    remote_configured: bool,
    could_manage: bool,
}

impl AccessEvaluator {
    pub fn new(remote_configured: bool) -> Self {
        Self {
            remote_configured,
            could_manage: can_manage_sites(None, remote_configured),
        }
    }

    /// Feed the current identity; returns the unlock event when the
    /// capability was just granted.
    pub fn observe(&mut self, identity: Option<&Identity>) -> Option<AccessEvent> {
        let can_manage = can_manage_sites(identity, self.remote_configured);
        let unlocked = can_manage && !self.could_manage;
        self.could_manage = can_manage;
        unlocked.then_some(AccessEvent::ManageUnlocked)
    }

    pub fn can_manage(&self) -> bool {
        self.could_manage
    }
}

/// Displayable identity summary for the status panel.
pub fn identity_summary(identity: Option<&Identity>, remote_configured: bool) -> (String, Tone) {
    if !remote_configured {
        return ("Local mode · editing enabled".to_string(), Tone::Success);
    }
    match identity {
        None => ("Signed out · sites are read-only".to_string(), Tone::Info),
        Some(identity) if is_admin(Some(identity)) => {
            (format!("Admin · {}", identity.email), Tone::Success)
        }
        Some(identity) => (format!("Guest · {}", identity.email), Tone::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(app: Value, user: Value) -> Identity {
        Identity {
            id: "u1".into(),
            email: "user@example.com".into(),
            app_metadata: app,
            user_metadata: user,
        }
    }

    #[test]
    fn collect_roles_reads_both_shapes() {
        let roles = collect_roles(&json!({"role": " admin ", "roles": ["editor", "admin"]}));
        assert_eq!(
            roles.into_iter().collect::<Vec<_>>(),
            vec!["admin".to_string(), "editor".to_string()]
        );
    }

    #[test]
    fn collect_roles_tolerates_malformed_metadata() {
        assert!(collect_roles(&json!(null)).is_empty());
        assert!(collect_roles(&json!({"role": 7, "roles": "admin"})).is_empty());
        assert!(collect_roles(&json!({"roles": [1, null, "  "]})).is_empty());
    }

    #[test]
    fn admin_requires_exact_token() {
        let editor = identity(json!({"roles": ["editor"]}), json!(null));
        assert!(!is_admin(Some(&editor)));
        assert!(!is_admin(None));

        let admin = identity(json!(null), json!({"role": "admin"}));
        assert!(is_admin(Some(&admin)));

        let administrator = identity(json!({"role": "administrator"}), json!(null));
        assert!(!is_admin(Some(&administrator)));
    }

    #[test]
    fn unconfigured_remote_always_allows_management() {
        assert!(can_manage_sites(None, false));
        let editor = identity(json!({"roles": ["editor"]}), json!(null));
        assert!(can_manage_sites(Some(&editor), false));
        assert!(!can_manage_sites(Some(&editor), true));
        assert!(!can_manage_sites(None, true));
    }

    #[test]
    fn unlock_event_fires_once_per_transition() {
        let mut evaluator = AccessEvaluator::new(true);
        assert!(!evaluator.can_manage());

        let admin = identity(json!({"role": "admin"}), json!(null));
        assert_eq!(
            evaluator.observe(Some(&admin)),
            Some(AccessEvent::ManageUnlocked)
        );
        // Still admin: no second event.
        assert_eq!(evaluator.observe(Some(&admin)), None);

        // Sign out, then back in: a fresh edge fires again.
        assert_eq!(evaluator.observe(None), None);
        assert_eq!(
            evaluator.observe(Some(&admin)),
            Some(AccessEvent::ManageUnlocked)
        );
    }

    #[test]
    fn local_mode_evaluator_starts_unlocked() {
        let mut evaluator = AccessEvaluator::new(false);
        assert!(evaluator.can_manage());
        assert_eq!(evaluator.observe(None), None);
    }

    #[test]
    fn summary_reflects_mode_and_role() {
        let (label, tone) = identity_summary(None, false);
        assert!(label.starts_with("Local mode"));
        assert_eq!(tone, Tone::Success);

        let (label, tone) = identity_summary(None, true);
        assert!(label.starts_with("Signed out"));
        assert_eq!(tone, Tone::Info);

        let admin = identity(json!({"role": "admin"}), json!(null));
        let (label, tone) = identity_summary(Some(&admin), true);
        assert_eq!(label, "Admin · user@example.com");
        assert_eq!(tone, Tone::Success);

        let guest = identity(json!(null), json!(null));
        let (label, _) = identity_summary(Some(&guest), true);
        assert!(label.starts_with("Guest"));
    }
}
