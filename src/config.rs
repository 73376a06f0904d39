//! Remote backend configuration resolved from the environment.

use std::env;

/// Environment variable naming the remote base URL.
pub const REMOTE_URL_VAR: &str = "LINKBOARD_REMOTE_URL";
/// Environment variable holding the public (anon) API key.
pub const ANON_KEY_VAR: &str = "LINKBOARD_ANON_KEY";
/// Optional environment variable for the magic-link redirect target.
pub const REDIRECT_URL_VAR: &str = "LINKBOARD_REDIRECT_URL";

/// Connection settings for the remote row store and its auth endpoints.
///
/// Constructed explicitly and handed to the gateway; "not configured" is an
/// absent `RemoteConfig`, not a null client.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub anon_key: String,
    pub redirect_url: Option<String>,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_url: None,
        }
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    /// Read the remote configuration from the environment. Returns `None`
    /// when either the base URL or the anon key is unset or blank, which
    /// puts the engine in local-only mode.
    pub fn from_env() -> Option<Self> {
        let base_url = non_blank(env::var(REMOTE_URL_VAR).ok()?)?;
        let anon_key = non_blank(env::var(ANON_KEY_VAR).ok()?)?;
        let mut config = Self::new(base_url, anon_key);
        if let Some(redirect) = env::var(REDIRECT_URL_VAR).ok().and_then(non_blank) {
            config.redirect_url = Some(redirect);
        }
        Some(config)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let config = RemoteConfig::new("https://api.example.com/", "key");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.redirect_url, None);
    }

    #[test]
    fn redirect_url_is_optional() {
        let config =
            RemoteConfig::new("https://api.example.com", "key").with_redirect_url("https://app");
        assert_eq!(config.redirect_url.as_deref(), Some("https://app"));
    }
}
