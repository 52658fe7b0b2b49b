//! Well-known skills provider (RFC 8615 style discovery).
//!
//! Any http(s) site can publish skills under
//! `<base>/.well-known/skills/index.json`, with per-skill content at
//! `<base>/.well-known/skills/<name>/SKILL.md` plus any extra files the
//! index lists. This provider is the registry's fallback: it only sees URLs
//! no dedicated provider claimed.

use std::collections::BTreeMap;

use {
    async_trait::async_trait,
    futures::future::join_all,
    serde::Deserialize,
};

use {
    super::{EXCLUDED_GIT_HOSTS, HostProvider, ProviderMatch, RemoteSkill, is_http_url, url_host},
    crate::{discover::SKILL_FILE, parse},
};

/// Well-known URI suffix for skill discovery.
pub const WELL_KNOWN_SUFFIX: &str = "/.well-known/skills";

/// One skill entry in the well-known index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WellKnownSkillEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Files in the skill directory, relative names only.
    #[serde(default)]
    pub files: Vec<String>,
}

/// The `index.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WellKnownIndex {
    #[serde(default)]
    pub skills: Vec<WellKnownSkillEntry>,
}

pub struct WellKnownProvider;

impl WellKnownProvider {
    /// Compute the well-known base for a URL. Idempotent: a URL already
    /// under `.well-known/skills` keeps its existing base.
    pub fn well_known_base(url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let origin = parsed.origin().ascii_serialization();
        let path = parsed.path().trim_end_matches('/');

        if let Some(idx) = path.find(WELL_KNOWN_SUFFIX) {
            let base_path = &path[..idx + WELL_KNOWN_SUFFIX.len()];
            return Some(format!("{origin}{base_path}"));
        }
        Some(format!("{origin}{path}{WELL_KNOWN_SUFFIX}"))
    }

    /// Fetch and decode the skills index for a site.
    pub async fn fetch_index(client: &reqwest::Client, base_url: &str) -> Option<WellKnownIndex> {
        let base = Self::well_known_base(base_url)?;
        let response = client.get(format!("{base}/index.json")).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<WellKnownIndex>().await.ok()
    }

    /// Whether a site publishes a non-empty skills index.
    pub async fn has_skills_index(client: &reqwest::Client, url: &str) -> bool {
        Self::fetch_index(client, url)
            .await
            .is_some_and(|index| !index.skills.is_empty())
    }

    /// Fetch one indexed skill: `SKILL.md` plus every other listed file,
    /// fetched concurrently. A failed extra file is dropped; a failed
    /// `SKILL.md` fails the skill.
    pub async fn fetch_skill_by_entry(
        client: &reqwest::Client,
        base_url: &str,
        entry: &WellKnownSkillEntry,
    ) -> Option<RemoteSkill> {
        let base = Self::well_known_base(base_url)?;
        let skill_base = format!("{base}/{}", entry.name);

        let skill_md_url = format!("{skill_base}/{SKILL_FILE}");
        let response = client.get(&skill_md_url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content = response.text().await.ok()?;

        // Frontmatter is optional here; the index entry supplies fallbacks.
        let (name, description, metadata) = match parse::parse_skill_doc(&content) {
            Ok(doc) => (doc.name, doc.description, (!doc.metadata.is_empty()).then_some(doc.metadata)),
            Err(_) => (entry.name.clone(), entry.description.clone(), None),
        };

        let mut files = BTreeMap::from([(SKILL_FILE.to_string(), content.clone())]);
        let extra_names: Vec<&String> = entry
            .files
            .iter()
            .filter(|file| file.as_str() != SKILL_FILE && is_valid_skill_file(file))
            .collect();

        let fetches = extra_names.iter().map(|file| {
            let file_url = format!("{skill_base}/{file}");
            let client = client.clone();
            async move {
                let response = client.get(&file_url).send().await.ok()?;
                if !response.status().is_success() {
                    return None;
                }
                response.text().await.ok()
            }
        });
        for (file, fetched) in extra_names.iter().zip(join_all(fetches).await) {
            if let Some(body) = fetched {
                files.insert((*file).clone(), body);
            }
        }

        Some(RemoteSkill {
            name,
            description,
            content,
            install_name: entry.name.clone(),
            source_url: skill_md_url,
            metadata,
            files,
        })
    }

    /// Fetch every indexed skill concurrently, dropping failures.
    pub async fn fetch_all_skills(client: &reqwest::Client, url: &str) -> Vec<RemoteSkill> {
        let Some(index) = Self::fetch_index(client, url).await else {
            return Vec::new();
        };
        let fetches = index
            .skills
            .iter()
            .map(|entry| Self::fetch_skill_by_entry(client, url, entry));
        join_all(fetches).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl HostProvider for WellKnownProvider {
    fn id(&self) -> &'static str {
        "well-known"
    }

    fn display_name(&self) -> &'static str {
        "Well-Known Skills"
    }

    fn matches(&self, url: &str) -> ProviderMatch {
        if !is_http_url(url) {
            return ProviderMatch::none();
        }
        let Some(host) = url_host(url) else {
            return ProviderMatch::none();
        };
        if EXCLUDED_GIT_HOSTS.contains(&host.as_str()) {
            return ProviderMatch::none();
        }
        // Direct skill.md links belong to Mintlify; git URLs to the cloner.
        if url.to_lowercase().ends_with("/skill.md") || url.ends_with(".git") {
            return ProviderMatch::none();
        }
        ProviderMatch::matched(self.source_identifier(url))
    }

    fn to_raw_url(&self, url: &str) -> String {
        url.to_string()
    }

    fn source_identifier(&self, url: &str) -> String {
        url_host(url).unwrap_or_else(|| url.to_string())
    }

    async fn fetch_skill(&self, client: &reqwest::Client, url: &str) -> Option<RemoteSkill> {
        let index = Self::fetch_index(client, url).await?;
        if index.skills.is_empty() {
            return None;
        }

        // A URL naming one skill under the well-known path selects it;
        // otherwise the first indexed skill is fetched.
        if let Some(requested) = requested_skill_name(url) {
            let entry = index.skills.iter().find(|entry| entry.name == requested)?;
            return Self::fetch_skill_by_entry(client, url, entry).await;
        }
        Self::fetch_skill_by_entry(client, url, &index.skills[0]).await
    }
}

/// Single path segment following `.well-known/skills/` in a URL, if any.
fn requested_skill_name(url: &str) -> Option<String> {
    let marker = "/.well-known/skills/";
    let idx = url.find(marker)?;
    let remainder = url[idx + marker.len()..].trim_matches('/');
    if remainder.is_empty() || remainder.contains('/') {
        return None;
    }
    Some(remainder.to_string())
}

/// Listed file names must be plain relative paths: nothing absolute and no
/// `..` anywhere, even inside an otherwise innocent filename.
fn is_valid_skill_file(file: &str) -> bool {
    !file.starts_with('/') && !file.starts_with('\\') && !file.contains("..")
}
