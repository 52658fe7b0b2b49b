//! Remote skill providers.
//!
//! A provider recognizes and fetches skill documents from one class of
//! remote host. The registry tries providers in registration order; the
//! well-known provider is a deliberate fallback that is never registered by
//! default, so it cannot pre-empt a more specific match.

pub mod huggingface;
pub mod mintlify;
pub mod wellknown;

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;

pub use self::{
    huggingface::HuggingFaceProvider,
    mintlify::MintlifyProvider,
    wellknown::{WellKnownIndex, WellKnownProvider, WellKnownSkillEntry},
};

/// Hosts with dedicated handling; generic URL providers never match them.
pub const EXCLUDED_GIT_HOSTS: &[&str] = &[
    "github.com",
    "gitlab.com",
    "huggingface.co",
    "raw.githubusercontent.com",
];

/// A skill fetched from a remote host.
#[derive(Debug, Clone)]
pub struct RemoteSkill {
    /// Display name from frontmatter.
    pub name: String,
    pub description: String,
    /// Full `SKILL.md` document text.
    pub content: String,
    /// Filesystem-safe installation directory name.
    pub install_name: String,
    /// Original source URL.
    pub source_url: String,
    /// Extra frontmatter keys, when present.
    pub metadata: Option<BTreeMap<String, serde_yaml::Value>>,
    /// All files of the skill keyed by filename. Always contains `SKILL.md`;
    /// well-known skills may carry more.
    pub files: BTreeMap<String, String>,
}

/// A provider's verdict on a URL, with a grouping key for update batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMatch {
    pub matches: bool,
    /// e.g. `mintlify/docs.example.com`.
    pub source_identifier: Option<String>,
}

impl ProviderMatch {
    pub fn none() -> Self {
        Self {
            matches: false,
            source_identifier: None,
        }
    }

    pub fn matched(source_identifier: impl Into<String>) -> Self {
        Self {
            matches: true,
            source_identifier: Some(source_identifier.into()),
        }
    }
}

/// Capability set of a host provider.
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Unique provider id (also the `sourceType` recorded in the lock file).
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Check whether this provider handles the given URL.
    fn matches(&self, url: &str) -> ProviderMatch;

    /// Convert a user-facing URL to a raw content URL.
    fn to_raw_url(&self, url: &str) -> String;

    /// Grouping identifier for telemetry and update batching.
    fn source_identifier(&self, url: &str) -> String;

    /// Fetch a skill. Network errors, non-200 responses, and missing
    /// required frontmatter all yield `None`.
    async fn fetch_skill(&self, client: &reqwest::Client, url: &str) -> Option<RemoteSkill>;
}

/// Ordered provider collection with duplicate-id suppression.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn HostProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// The built-in registration order: HuggingFace before Mintlify. The
    /// well-known fallback is intentionally absent.
    pub fn with_default_providers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HuggingFaceProvider));
        registry.register(Arc::new(MintlifyProvider));
        registry
    }

    /// Register a provider. Registering an id twice is a no-op.
    pub fn register(&mut self, provider: Arc<dyn HostProvider>) {
        if self.providers.iter().any(|existing| existing.id() == provider.id()) {
            return;
        }
        self.providers.push(provider);
    }

    /// First registered provider matching the URL.
    pub fn find_provider(&self, url: &str) -> Option<Arc<dyn HostProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.matches(url).matches)
            .cloned()
    }

    pub fn providers(&self) -> &[Arc<dyn HostProvider>] {
        &self.providers
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_default_providers()
    }
}

/// Fetch a skill from a remote URL: registered providers first, then the
/// well-known fallback.
pub async fn fetch_remote_skill(
    registry: &ProviderRegistry,
    client: &reqwest::Client,
    url: &str,
) -> Option<RemoteSkill> {
    if let Some(provider) = registry.find_provider(url) {
        return provider.fetch_skill(client, url).await;
    }

    let fallback = WellKnownProvider;
    if fallback.matches(url).matches {
        return fallback.fetch_skill(client, url).await;
    }

    None
}

/// Host name of an http(s) URL, when parseable.
pub(crate) fn url_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.host_str().map(ToOwned::to_owned)
}

/// Whether a URL uses the http or https scheme.
pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Derive an install name from a display name: lowercase, spaces to hyphens.
pub(crate) fn install_name_from_display(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_match_constructors() {
        let hit = ProviderMatch::matched("mintlify/docs.com");
        assert!(hit.matches);
        assert_eq!(hit.source_identifier.as_deref(), Some("mintlify/docs.com"));

        let miss = ProviderMatch::none();
        assert!(!miss.matches);
        assert!(miss.source_identifier.is_none());
    }

    #[test]
    fn registry_suppresses_duplicate_ids() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MintlifyProvider));
        registry.register(Arc::new(MintlifyProvider));
        assert_eq!(registry.providers().len(), 1);
    }

    #[test]
    fn registry_dispatches_in_order() {
        let registry = ProviderRegistry::with_default_providers();

        let provider = registry
            .find_provider("https://huggingface.co/spaces/owner/repo/blob/main/skill.md")
            .unwrap();
        assert_eq!(provider.id(), "huggingface");

        let provider = registry
            .find_provider("https://docs.example.com/api/skill.md")
            .unwrap();
        assert_eq!(provider.id(), "mintlify");
    }

    #[test]
    fn registry_returns_none_for_git_hosts() {
        let registry = ProviderRegistry::with_default_providers();
        assert!(registry.find_provider("https://github.com/owner/repo").is_none());
    }

    #[test]
    fn default_registry_excludes_well_known() {
        let registry = ProviderRegistry::default();
        assert!(registry.providers().iter().all(|p| p.id() != "well-known"));
    }
}
