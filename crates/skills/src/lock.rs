//! Lock file: installed-skill provenance for update checks.
//!
//! A versioned JSON document at `~/.agents/.skill-lock.json`. Reading a
//! missing, corrupt, or stale-versioned file yields a fresh empty structure;
//! there is no field-level migration. The file is rewritten whole after
//! every mutation, atomically via temp file + rename.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
};

/// Current lock schema version. Older files are wiped, not migrated.
pub const CURRENT_VERSION: u32 = 3;

/// One installed skill's provenance, keyed by skill name in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLockEntry {
    /// Normalized source identifier (e.g. `owner/repo`, `mintlify/docs.bun.sh`).
    pub source: String,
    /// Provider or source kind (e.g. `github`, `mintlify`).
    pub source_type: String,
    /// Original URL for re-fetching updates.
    pub source_url: String,
    /// Remote folder hash (git tree SHA) for update detection.
    pub skill_folder_hash: String,
    /// Subpath of the skill within the source repo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_path: Option<String>,
    pub installed_at: String,
    pub updated_at: String,
}

/// Prompts the user dismissed; never shown again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissedPrompts {
    #[serde(default)]
    pub find_skills_prompt: bool,
}

/// The whole lock document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillLockFile {
    pub version: u32,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillLockEntry>,
    #[serde(default)]
    pub dismissed: DismissedPrompts,
    #[serde(
        default,
        rename = "lastSelectedAgents",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_selected_agents: Option<Vec<String>>,
}

impl Default for SkillLockFile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            skills: BTreeMap::new(),
            dismissed: DismissedPrompts::default(),
            last_selected_agents: None,
        }
    }
}

/// Fields for a lock upsert, minus the timestamps the store manages itself.
#[derive(Debug, Clone)]
pub struct NewLockEntry {
    pub source: String,
    pub source_type: String,
    pub source_url: String,
    pub skill_folder_hash: String,
    pub skill_path: Option<String>,
}

/// Lock file storage.
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the fixed global path `~/.agents/.skill-lock.json`.
    pub fn default_store() -> Self {
        Self::new(skillpack_config::skill_lock_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the lock file. Missing file, unreadable JSON, or a version older
    /// than [`CURRENT_VERSION`] all produce a fresh empty structure.
    pub fn load(&self) -> SkillLockFile {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return SkillLockFile::default(),
        };
        match serde_json::from_str::<SkillLockFile>(&data) {
            Ok(lock) if lock.version >= CURRENT_VERSION => lock,
            Ok(stale) => {
                tracing::debug!(version = stale.version, "stale lock file, starting fresh");
                SkillLockFile::default()
            },
            Err(e) => {
                tracing::debug!(%e, "unreadable lock file, starting fresh");
                SkillLockFile::default()
            },
        }
    }

    /// Write the lock file atomically, creating parent directories. Always
    /// emits the current schema version.
    pub fn save(&self, lock: &SkillLockFile) -> anyhow::Result<()> {
        let mut lock = lock.clone();
        lock.version = CURRENT_VERSION;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(&lock)?;
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Upsert a skill entry by name. An update keeps the original
    /// `installed_at` and refreshes `updated_at`.
    pub fn add_skill(&self, skill_name: &str, entry: NewLockEntry) -> anyhow::Result<()> {
        let mut lock = self.load();
        let now = now_timestamp();
        let installed_at = lock
            .skills
            .get(skill_name)
            .map(|existing| existing.installed_at.clone())
            .unwrap_or_else(|| now.clone());

        lock.skills.insert(
            skill_name.to_string(),
            SkillLockEntry {
                source: entry.source,
                source_type: entry.source_type,
                source_url: entry.source_url,
                skill_folder_hash: entry.skill_folder_hash,
                skill_path: entry.skill_path,
                installed_at,
                updated_at: now,
            },
        );
        self.save(&lock)
    }

    /// Remove a skill entry. Returns whether it existed.
    pub fn remove_skill(&self, skill_name: &str) -> anyhow::Result<bool> {
        let mut lock = self.load();
        if lock.skills.remove(skill_name).is_none() {
            return Ok(false);
        }
        self.save(&lock)?;
        Ok(true)
    }

    pub fn get_skill(&self, skill_name: &str) -> Option<SkillLockEntry> {
        self.load().skills.get(skill_name).cloned()
    }

    /// Skill names grouped by source identifier, for batch update checks.
    pub fn skills_by_source(&self) -> BTreeMap<String, Vec<String>> {
        let mut by_source: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, entry) in self.load().skills {
            by_source.entry(entry.source).or_default().push(name);
        }
        by_source
    }

    pub fn is_prompt_dismissed(&self) -> bool {
        self.load().dismissed.find_skills_prompt
    }

    pub fn dismiss_prompt(&self) -> anyhow::Result<()> {
        let mut lock = self.load();
        lock.dismissed.find_skills_prompt = true;
        self.save(&lock)
    }

    pub fn last_selected_agents(&self) -> Option<Vec<String>> {
        self.load().last_selected_agents
    }

    pub fn save_selected_agents(&self, agents: Vec<String>) -> anyhow::Result<()> {
        let mut lock = self.load();
        lock.last_selected_agents = Some(agents);
        self.save(&lock)
    }
}

/// SHA-256 hex digest of document content, for local change detection.
pub fn compute_content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Normalize a skill path for the GitHub trees API: drop the `SKILL.md`
/// suffix and trailing separators, convert backslashes to forward slashes.
pub fn normalize_skill_path(skill_path: &str) -> String {
    let mut folder = skill_path;
    if let Some(stripped) = folder.strip_suffix("/SKILL.md").or_else(|| folder.strip_suffix("\\SKILL.md")) {
        folder = stripped;
    } else if let Some(stripped) = folder.strip_suffix("SKILL.md") {
        folder = stripped;
    }
    folder.trim_end_matches(['/', '\\']).replace('\\', "/")
}

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Fetch the git tree SHA for a skill's folder, trying `main` then `master`.
/// Root-level skills get the root tree SHA. Any failure yields `None`.
pub async fn fetch_skill_folder_hash(
    client: &reqwest::Client,
    owner_repo: &str,
    skill_path: &str,
) -> Option<String> {
    fetch_folder_hash_at(client, GITHUB_API_BASE, owner_repo, skill_path).await
}

async fn fetch_folder_hash_at(
    client: &reqwest::Client,
    api_base: &str,
    owner_repo: &str,
    skill_path: &str,
) -> Option<String> {
    let folder_path = normalize_skill_path(skill_path);

    for branch in ["main", "master"] {
        let url = format!("{api_base}/repos/{owner_repo}/git/trees/{branch}?recursive=1");
        let response = match client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "skillpack")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%branch, %e, "tree lookup failed");
                continue;
            },
        };
        if !response.status().is_success() {
            continue;
        }
        let data: serde_json::Value = match response.json().await {
            Ok(data) => data,
            Err(_) => continue,
        };

        if folder_path.is_empty() {
            return data.get("sha").and_then(|v| v.as_str()).map(ToOwned::to_owned);
        }

        let Some(entries) = data.get("tree").and_then(|v| v.as_array()) else {
            continue;
        };
        for entry in entries {
            if entry.get("type").and_then(|v| v.as_str()) == Some("tree")
                && entry.get("path").and_then(|v| v.as_str()) == Some(folder_path.as_str())
            {
                return entry.get("sha").and_then(|v| v.as_str()).map(ToOwned::to_owned);
            }
        }
    }

    None
}

fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str) -> NewLockEntry {
        NewLockEntry {
            source: source.to_string(),
            source_type: "github".to_string(),
            source_url: format!("https://github.com/{source}.git"),
            skill_folder_hash: "abc123".to_string(),
            skill_path: Some("skills/demo/SKILL.md".to_string()),
        }
    }

    #[test]
    fn load_missing_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("missing.json"));
        let lock = store.load();
        assert_eq!(lock.version, CURRENT_VERSION);
        assert!(lock.skills.is_empty());
        assert!(!lock.dismissed.find_skills_prompt);
    }

    #[test]
    fn load_corrupt_returns_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lock.json");
        std::fs::write(&path, "{not json").unwrap();
        let lock = LockStore::new(path).load();
        assert!(lock.skills.is_empty());
    }

    #[test]
    fn stale_version_is_wiped_wholesale() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lock.json");
        std::fs::write(
            &path,
            r#"{"version":2,"skills":{"old":{"source":"a/b","sourceType":"github","sourceUrl":"u","skillFolderHash":"h","installedAt":"t","updatedAt":"t"}}}"#,
        )
        .unwrap();
        let lock = LockStore::new(path).load();
        assert_eq!(lock.version, CURRENT_VERSION);
        assert!(lock.skills.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("nested/dir/lock.json"));
        store.add_skill("demo", entry("owner/repo")).unwrap();

        let lock = store.load();
        assert_eq!(lock.version, CURRENT_VERSION);
        let saved = &lock.skills["demo"];
        assert_eq!(saved.source, "owner/repo");
        assert_eq!(saved.skill_folder_hash, "abc123");
        assert_eq!(saved.skill_path.as_deref(), Some("skills/demo/SKILL.md"));
        assert!(!saved.installed_at.is_empty());
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        store.add_skill("demo", entry("owner/repo")).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"sourceType\""));
        assert!(raw.contains("\"skillFolderHash\""));
        assert!(raw.contains("\"installedAt\""));
        assert!(!raw.contains("\"source_type\""));
    }

    #[test]
    fn upsert_preserves_installed_at() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));

        store.add_skill("demo", entry("owner/repo")).unwrap();
        let first = store.get_skill("demo").unwrap();

        let mut updated = entry("owner/repo");
        updated.skill_folder_hash = "def456".to_string();
        store.add_skill("demo", updated).unwrap();

        let second = store.get_skill("demo").unwrap();
        assert_eq!(second.installed_at, first.installed_at);
        assert_eq!(second.skill_folder_hash, "def456");
    }

    #[test]
    fn remove_skill_reports_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        store.add_skill("demo", entry("owner/repo")).unwrap();

        assert!(store.remove_skill("demo").unwrap());
        assert!(!store.remove_skill("demo").unwrap());
        assert!(store.get_skill("demo").is_none());
    }

    #[test]
    fn skills_group_by_source() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        store.add_skill("a", entry("owner/repo")).unwrap();
        store.add_skill("b", entry("owner/repo")).unwrap();
        store.add_skill("c", entry("other/repo")).unwrap();

        let grouped = store.skills_by_source();
        assert_eq!(grouped["owner/repo"], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(grouped["other/repo"], vec!["c".to_string()]);
    }

    #[test]
    fn prompt_dismissal_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        assert!(!store.is_prompt_dismissed());
        store.dismiss_prompt().unwrap();
        assert!(store.is_prompt_dismissed());
    }

    #[test]
    fn selected_agents_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        assert!(store.last_selected_agents().is_none());
        store
            .save_selected_agents(vec!["amp".to_string(), "claude-code".to_string()])
            .unwrap();
        assert_eq!(
            store.last_selected_agents(),
            Some(vec!["amp".to_string(), "claude-code".to_string()])
        );
    }

    // ── hashing and path normalization ──────────────────────────────────

    #[test]
    fn content_hash_is_sha256_hex() {
        let hash = compute_content_hash("hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn normalize_strips_skill_md_suffix() {
        assert_eq!(normalize_skill_path("skills/my-skill/SKILL.md"), "skills/my-skill");
        assert_eq!(normalize_skill_path("skills\\my-skill\\SKILL.md"), "skills/my-skill");
        assert_eq!(normalize_skill_path("SKILL.md"), "");
        assert_eq!(normalize_skill_path("/SKILL.md"), "");
    }

    #[test]
    fn normalize_strips_trailing_separators() {
        assert_eq!(normalize_skill_path("skills/my-skill/"), "skills/my-skill");
        assert_eq!(normalize_skill_path("skills\\my-skill\\"), "skills/my-skill");
    }

    #[test]
    fn normalize_converts_backslashes() {
        assert_eq!(
            normalize_skill_path("skills\\.curated\\advanced-skill\\SKILL.md"),
            "skills/.curated/advanced-skill"
        );
        assert_eq!(
            normalize_skill_path("skills/category\\my-skill/SKILL.md"),
            "skills/category/my-skill"
        );
        assert_eq!(normalize_skill_path("a\\b\\c\\d\\e\\SKILL.md"), "a/b/c/d/e");
    }

    // ── folder hash lookup ──────────────────────────────────────────────

    #[tokio::test]
    async fn folder_hash_reads_tree_entry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/owner/repo/git/trees/main?recursive=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "sha": "root-sha",
                    "tree": [
                        {"path": "skills", "type": "tree", "sha": "container-sha"},
                        {"path": "skills/my-skill", "type": "tree", "sha": "folder-sha"},
                        {"path": "skills/my-skill/SKILL.md", "type": "blob", "sha": "blob-sha"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sha = fetch_folder_hash_at(
            &client,
            &server.url(),
            "owner/repo",
            "skills/my-skill/SKILL.md",
        )
        .await;
        assert_eq!(sha.as_deref(), Some("folder-sha"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn folder_hash_root_skill_uses_root_sha() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/owner/repo/git/trees/main?recursive=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({"sha": "root-sha", "tree": []}).to_string())
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sha = fetch_folder_hash_at(&client, &server.url(), "owner/repo", "SKILL.md").await;
        assert_eq!(sha.as_deref(), Some("root-sha"));
    }

    #[tokio::test]
    async fn folder_hash_falls_back_to_master() {
        let mut server = mockito::Server::new_async().await;
        let _main = server
            .mock("GET", "/repos/owner/repo/git/trees/main?recursive=1")
            .with_status(404)
            .create_async()
            .await;
        let _master = server
            .mock("GET", "/repos/owner/repo/git/trees/master?recursive=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({"sha": "master-root", "tree": []}).to_string())
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let sha = fetch_folder_hash_at(&client, &server.url(), "owner/repo", "").await;
        assert_eq!(sha.as_deref(), Some("master-root"));
    }

    #[tokio::test]
    async fn folder_hash_missing_folder_is_none() {
        let mut server = mockito::Server::new_async().await;
        for branch in ["main", "master"] {
            server
                .mock(
                    "GET",
                    format!("/repos/owner/repo/git/trees/{branch}?recursive=1").as_str(),
                )
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(serde_json::json!({"sha": "root", "tree": []}).to_string())
                .create_async()
                .await;
        }

        let client = reqwest::Client::new();
        let sha =
            fetch_folder_hash_at(&client, &server.url(), "owner/repo", "skills/nope").await;
        assert_eq!(sha, None);
    }
}
