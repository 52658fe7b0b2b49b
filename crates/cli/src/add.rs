//! The `add` command: resolve a source, collect its skills, and install
//! them for the selected agents.

use std::path::{Component, Path};

use anyhow::{Context, bail};

use skillpack_skills::{
    agents, discover, fetch,
    install::{self, sanitize_name},
    lock::{LockStore, NewLockEntry, compute_content_hash, fetch_skill_folder_hash},
    providers::{self, HostProvider, ProviderRegistry},
    source::{SourceKind, SourceRef, get_owner_repo, parse_source},
    types::{InstallMode, InstallResult, Skill},
};

pub struct AddOptions {
    pub source: String,
    pub is_global: bool,
    pub agents: Vec<String>,
    pub skills: Vec<String>,
    pub list_only: bool,
    pub yes: bool,
    pub all: bool,
    pub full_depth: bool,
    pub copy: bool,
}

pub async fn run_add(mut opts: AddOptions) -> anyhow::Result<()> {
    if opts.all {
        opts.skills = vec!["*".to_string()];
        opts.agents = vec!["*".to_string()];
        opts.yes = true;
    }

    let cwd = std::env::current_dir()?;
    let client = crate::http_client()?;
    let store = LockStore::default_store();
    let source_ref = parse_source(&opts.source);
    tracing::debug!(kind = source_ref.kind.as_str(), "resolved source");

    match source_ref.kind {
        SourceKind::DirectUrl => {
            add_from_provider(&opts, &client, &source_ref, &cwd, &store).await
        },
        _ => add_from_tree(&opts, &client, &source_ref, &cwd, &store).await,
    }
}

/// Install a skill served by a remote host provider (direct URL sources).
async fn add_from_provider(
    opts: &AddOptions,
    client: &reqwest::Client,
    source_ref: &SourceRef,
    cwd: &Path,
    store: &LockStore,
) -> anyhow::Result<()> {
    let url = source_ref.url.as_deref().context("direct source is missing its URL")?;
    let registry = ProviderRegistry::default();

    let (source_type, source_id) = match registry.find_provider(url) {
        Some(provider) => (provider.id(), provider.source_identifier(url)),
        None => (
            providers::WellKnownProvider.id(),
            providers::WellKnownProvider.source_identifier(url),
        ),
    };

    let Some(remote) = providers::fetch_remote_skill(&registry, client, url).await else {
        bail!("could not fetch a skill from {url}");
    };

    if opts.list_only {
        println!("{} — {}", remote.name, remote.description);
        return Ok(());
    }

    // Stage the fetched files so the installer can copy a directory.
    let staged = tempfile::tempdir()?;
    let skill_dir = staged.path().join(sanitize_name(&remote.install_name));
    tokio::fs::create_dir_all(&skill_dir).await?;
    for (file, body) in &remote.files {
        let dest = skill_dir.join(file);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, body).await?;
    }

    let skill = Skill {
        name: remote.install_name.clone(),
        description: remote.description.clone(),
        path: skill_dir,
        content: remote.content.clone(),
    };

    let agent_ids = resolve_agents(&opts.agents, store)?;
    if !opts.yes {
        println!("Installing {} for {} agent(s)...", remote.name, agent_ids.len());
    }

    let mode = install_mode(opts);
    let installed_any =
        install_for_agents(&skill, &remote.name, &agent_ids, opts.is_global, cwd, mode).await?;

    if installed_any {
        store.add_skill(
            &remote.name,
            NewLockEntry {
                source: source_id,
                source_type: source_type.to_string(),
                source_url: url.to_string(),
                skill_folder_hash: compute_content_hash(&remote.content),
                skill_path: None,
            },
        )?;
        store.save_selected_agents(agent_ids)?;
    }
    Ok(())
}

/// Install skills discovered in a fetched (or local) source tree.
async fn add_from_tree(
    opts: &AddOptions,
    client: &reqwest::Client,
    source_ref: &SourceRef,
    cwd: &Path,
    store: &LockStore,
) -> anyhow::Result<()> {
    let tree = fetch::fetch_source_tree(client, source_ref, cwd).await?;
    let scan_root = match source_ref.subpath.as_deref() {
        Some(subpath) => tree.root.join(subpath),
        None => tree.root.clone(),
    };

    let skills = discover::discover_skills(&scan_root, opts.full_depth).await?;
    if skills.is_empty() {
        println!("No skills found in {}", opts.source);
        if !store.is_prompt_dismissed() {
            println!("Tip: search the index with `skillpack find <query>`.");
        }
        return Ok(());
    }

    let mut selected = skills.clone();
    if let Some(filter) = &source_ref.skill_filter {
        selected = discover::filter_skills(&selected, std::slice::from_ref(filter));
    }
    if !opts.skills.is_empty() && !opts.skills.iter().any(|name| name == "*") {
        selected = discover::filter_skills(&selected, &opts.skills);
    }
    if selected.is_empty() {
        let available: Vec<&str> = skills.iter().map(|skill| skill.name.as_str()).collect();
        bail!("no skills matched; available: {}", available.join(", "));
    }

    if opts.list_only {
        for skill in &selected {
            println!("{} — {}", skill.name, skill.description);
        }
        return Ok(());
    }

    let agent_ids = resolve_agents(&opts.agents, store)?;
    if !opts.yes {
        println!(
            "Installing {} skill(s) for {} agent(s)...",
            selected.len(),
            agent_ids.len()
        );
    }

    let mode = install_mode(opts);
    let owner_repo = get_owner_repo(source_ref);

    for skill in &selected {
        let installed_any =
            install_for_agents(skill, &skill.name, &agent_ids, opts.is_global, cwd, mode).await?;
        if !installed_any {
            continue;
        }

        let skill_path = match source_ref.kind {
            SourceKind::Local => None,
            _ => relative_skill_path(&tree.root, &skill.path),
        };
        let folder_hash = match (&owner_repo, source_ref.kind) {
            (Some(owner_repo), SourceKind::GitHub) => {
                fetch_skill_folder_hash(client, owner_repo, skill_path.as_deref().unwrap_or(""))
                    .await
                    .unwrap_or_default()
            },
            _ => String::new(),
        };
        let (source, source_url) = match source_ref.kind {
            SourceKind::Local => (opts.source.clone(), opts.source.clone()),
            _ => (
                owner_repo.clone().unwrap_or_else(|| opts.source.clone()),
                source_ref.url.clone().unwrap_or_else(|| opts.source.clone()),
            ),
        };

        store.add_skill(
            &skill.name,
            NewLockEntry {
                source,
                source_type: source_ref.kind.as_str().to_string(),
                source_url,
                skill_folder_hash: folder_hash,
                skill_path,
            },
        )?;
    }

    store.save_selected_agents(agent_ids)?;
    Ok(())
}

/// Stage the skill's canonical copy once, then install for every agent as
/// an independent concurrent operation. One agent failing never cancels its
/// siblings; per-agent outcomes are reported individually.
async fn install_for_agents(
    skill: &Skill,
    display_name: &str,
    agent_ids: &[String],
    is_global: bool,
    cwd: &Path,
    mode: InstallMode,
) -> anyhow::Result<bool> {
    let staged = install::stage_skill_canonical(skill, is_global, cwd).await?;

    let installs = agent_ids
        .iter()
        .map(|agent| install::install_skill_for_agent(&staged, agent, is_global, cwd, mode));
    let results = futures::future::join_all(installs).await;

    let mut installed_any = false;
    for (agent, result) in agent_ids.iter().zip(&results) {
        installed_any |= result.success;
        report_install(display_name, agent, result);
    }
    Ok(installed_any)
}

fn install_mode(opts: &AddOptions) -> InstallMode {
    if opts.copy {
        InstallMode::Copy
    } else {
        InstallMode::Symlink
    }
}

/// Pick the agents to install for: explicit flags first, then detected
/// installations, then the last selection saved in the lock file.
fn resolve_agents(requested: &[String], store: &LockStore) -> anyhow::Result<Vec<String>> {
    if requested.iter().any(|agent| agent == "*") {
        return Ok(agents::all_agent_ids().iter().map(|id| (*id).to_string()).collect());
    }
    if !requested.is_empty() {
        for name in requested {
            if agents::find_agent(name).is_none() {
                bail!(
                    "unknown agent '{name}' (known agents: {})",
                    agents::all_agent_ids().join(", ")
                );
            }
        }
        return Ok(requested.to_vec());
    }

    let detected = agents::detect_installed_agents();
    if !detected.is_empty() {
        return Ok(detected.iter().map(|id| (*id).to_string()).collect());
    }

    if let Some(last) = store.last_selected_agents() {
        let known: Vec<String> = last
            .into_iter()
            .filter(|agent| agents::find_agent(agent).is_some())
            .collect();
        if !known.is_empty() {
            return Ok(known);
        }
    }

    bail!(
        "no installed agents detected; pass --agent <id> (known agents: {})",
        agents::all_agent_ids().join(", ")
    )
}

/// Path of a skill's document relative to the fetched repo root, in the
/// forward-slash form the update-check service expects.
fn relative_skill_path(root: &Path, skill_dir: &Path) -> Option<String> {
    if skill_dir == root {
        return Some("SKILL.md".to_string());
    }
    let relative = skill_dir.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("{}/SKILL.md", segments.join("/")))
}

fn report_install(skill_name: &str, agent: &str, result: &InstallResult) {
    if result.success {
        let note = if result.symlink_failed {
            " (copied; symlink unavailable)"
        } else {
            ""
        };
        println!("  + {skill_name} -> {agent}{note}");
    } else {
        println!(
            "  ! {skill_name} -> {agent}: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::path::PathBuf};

    #[test]
    fn relative_path_for_root_skill() {
        let root = Path::new("/tmp/clone-abc");
        assert_eq!(
            relative_skill_path(root, Path::new("/tmp/clone-abc")).as_deref(),
            Some("SKILL.md")
        );
    }

    #[test]
    fn relative_path_for_nested_skill() {
        let root = Path::new("/tmp/clone-abc");
        assert_eq!(
            relative_skill_path(root, Path::new("/tmp/clone-abc/skills/my-skill")).as_deref(),
            Some("skills/my-skill/SKILL.md")
        );
        assert_eq!(
            relative_skill_path(root, Path::new("/tmp/clone-abc/.claude/skills/my-skill"))
                .as_deref(),
            Some(".claude/skills/my-skill/SKILL.md")
        );
        assert_eq!(
            relative_skill_path(root, Path::new("/tmp/clone-abc/skills/.curated/advanced"))
                .as_deref(),
            Some("skills/.curated/advanced/SKILL.md")
        );
    }

    #[test]
    fn relative_path_outside_root_is_none() {
        let root = Path::new("/tmp/clone-abc");
        assert_eq!(relative_skill_path(root, Path::new("/tmp/other/my-skill")), None);
        // Component-wise matching: /tmp/abc is not a prefix of /tmp/abc123.
        assert_eq!(
            relative_skill_path(Path::new("/tmp/abc"), Path::new("/tmp/abc123/skills/x")),
            None
        );
    }

    #[test]
    fn resolve_agents_star_selects_all() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        let resolved = resolve_agents(&["*".to_string()], &store).unwrap();
        assert_eq!(resolved.len(), agents::all_agent_ids().len());
    }

    #[test]
    fn resolve_agents_rejects_unknown_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        let result = resolve_agents(&["nonexistent-agent".to_string()], &store);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown agent"));
    }

    #[test]
    fn resolve_agents_accepts_known_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LockStore::new(tmp.path().join("lock.json"));
        let requested = vec!["amp".to_string(), "claude-code".to_string()];
        assert_eq!(resolve_agents(&requested, &store).unwrap(), requested);
    }

    #[test]
    fn install_mode_follows_copy_flag() {
        let mut opts = AddOptions {
            source: String::new(),
            is_global: false,
            agents: Vec::new(),
            skills: Vec::new(),
            list_only: false,
            yes: false,
            all: false,
            full_depth: false,
            copy: false,
        };
        assert_eq!(install_mode(&opts), InstallMode::Symlink);
        opts.copy = true;
        assert_eq!(install_mode(&opts), InstallMode::Copy);
    }

    #[test]
    fn relative_path_windows_style_segments() {
        // Separator handling is platform-native; forward slashes come out
        // regardless of how the components were joined.
        let root = PathBuf::from("/tmp/base");
        let nested = root.join("skills").join("ts-library");
        assert_eq!(
            relative_skill_path(&root, &nested).as_deref(),
            Some("skills/ts-library/SKILL.md")
        );
    }
}
