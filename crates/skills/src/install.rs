//! Skill installation into per-agent directories.
//!
//! The canonical copy of an installed skill lives in the shared
//! `.agents/skills/<name>` directory of its scope; each agent directory
//! receives either a symlink to it or an independent copy. Agents whose
//! own convention *is* the shared directory are written directly, so a
//! symlink can never end up pointing at itself.

use std::path::Path;

use anyhow::Context;

use crate::{
    agents::{self, AgentLayout},
    discover::SKILL_FILE,
    parse,
    types::{InstallMode, InstallResult, InstalledSkill, Scope, Skill},
};

/// Maximum length of a sanitized skill folder name.
const MAX_NAME_LEN: usize = 255;

/// Fallback folder name for skills whose name sanitizes away entirely.
const UNNAMED_SKILL: &str = "unnamed-skill";

/// Turn a raw skill name into a safe directory name.
///
/// Lowercases, drops `..` segments and path separators as content (so
/// traversal attempts collapse into plain names), replaces runs of anything
/// outside `[a-z0-9._]` with a single hyphen, trims leading/trailing dots
/// and hyphens, and truncates. Idempotent.
pub fn sanitize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace("..", "");

    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '.' || ch == '_' {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches(['.', '-']);
    let truncated: String = trimmed.chars().take(MAX_NAME_LEN).collect();
    let name = truncated.trim_matches(['.', '-']);

    if name.is_empty() {
        UNNAMED_SKILL.to_string()
    } else {
        name.to_string()
    }
}

/// Install one skill for one agent.
///
/// Returns a structured per-pair result so multi-agent installs can
/// partially succeed: an unknown agent or a filesystem failure never
/// aborts sibling installs.
pub async fn install_skill_for_agent(
    skill: &Skill,
    agent_id: &str,
    is_global: bool,
    cwd: &Path,
    mode: InstallMode,
) -> InstallResult {
    let Some(agent) = agents::find_agent(agent_id) else {
        return InstallResult::failure(mode, format!("Unknown agent '{agent_id}'"));
    };

    match install_inner(skill, agent, is_global, cwd, mode).await {
        Ok(result) => result,
        Err(e) => InstallResult::failure(mode, e.to_string()),
    }
}

async fn install_inner(
    skill: &Skill,
    agent: &AgentLayout,
    is_global: bool,
    cwd: &Path,
    mode: InstallMode,
) -> anyhow::Result<InstallResult> {
    let scope_root = skillpack_config::scope_root(is_global, cwd);
    let folder = sanitize_name(&skill.name);
    let canonical = skillpack_config::canonical_skills_dir(is_global, cwd).join(&folder);
    let agent_path = agents::agent_skills_dir(agent, &scope_root).join(&folder);

    remove_corrupt_symlink(&canonical).await?;
    stage_skill(skill, &canonical).await?;

    if canonical == agent_path {
        // The agent's convention is the shared directory itself; the staged
        // content is already in place and linking would create a self-loop.
        return Ok(InstallResult {
            success: true,
            mode,
            path: agent_path,
            symlink_failed: false,
            error: None,
        });
    }

    if let Some(parent) = agent_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    remove_existing(&agent_path).await?;

    match mode {
        InstallMode::Copy => {
            copy_dir_recursive(&canonical, &agent_path).await?;
            Ok(InstallResult {
                success: true,
                mode: InstallMode::Copy,
                path: agent_path,
                symlink_failed: false,
                error: None,
            })
        },
        InstallMode::Symlink => match symlink_dir(&canonical, &agent_path) {
            Ok(()) => Ok(InstallResult {
                success: true,
                mode: InstallMode::Symlink,
                path: agent_path,
                symlink_failed: false,
                error: None,
            }),
            Err(e) => {
                // Symlinks can require privileges the user doesn't have
                // (notably on Windows); degrade to a copy for this agent.
                tracing::warn!(agent = agent.id, %e, "symlink failed, falling back to copy");
                copy_dir_recursive(&canonical, &agent_path).await?;
                Ok(InstallResult {
                    success: true,
                    mode: InstallMode::Copy,
                    path: agent_path,
                    symlink_failed: true,
                    error: None,
                })
            },
        },
    }
}

/// Stage a skill's content into its canonical shared location up front,
/// returning a skill rooted there. Installing the staged skill for several
/// agents concurrently is then link-only per agent, with no shared writes.
pub async fn stage_skill_canonical(
    skill: &Skill,
    is_global: bool,
    cwd: &Path,
) -> anyhow::Result<Skill> {
    let folder = sanitize_name(&skill.name);
    let canonical = skillpack_config::canonical_skills_dir(is_global, cwd).join(&folder);

    remove_corrupt_symlink(&canonical).await?;
    stage_skill(skill, &canonical).await?;

    Ok(Skill {
        name: skill.name.clone(),
        description: skill.description.clone(),
        path: canonical,
        content: skill.content.clone(),
    })
}

/// List skills in the canonical shared directory of a scope, attributing
/// each to the installed agents whose directory reaches it.
pub async fn list_installed_skills(
    is_global: bool,
    cwd: &Path,
    agent_filter: Option<&[String]>,
) -> anyhow::Result<Vec<InstalledSkill>> {
    let installed = agents::detect_installed_agents();
    list_installed_with_agents(is_global, cwd, agent_filter, &installed).await
}

/// Inner listing that takes the detected-agent set explicitly.
pub(crate) async fn list_installed_with_agents(
    is_global: bool,
    cwd: &Path,
    agent_filter: Option<&[String]>,
    installed_agents: &[&'static str],
) -> anyhow::Result<Vec<InstalledSkill>> {
    let scope_root = skillpack_config::scope_root(is_global, cwd);
    let skills_dir = skillpack_config::canonical_skills_dir(is_global, cwd);
    let scope = if is_global { Scope::Global } else { Scope::Project };

    let mut results = Vec::new();
    let mut entries = match tokio::fs::read_dir(&skills_dir).await {
        Ok(entries) => entries,
        Err(_) => return Ok(results),
    };

    while let Some(entry) = entries.next_entry().await? {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let content = match tokio::fs::read_to_string(dir.join(SKILL_FILE)).await {
            Ok(content) => content,
            Err(_) => continue,
        };
        let doc = match parse::parse_skill_doc(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(?dir, %e, "skipping invalid installed skill");
                continue;
            },
        };

        let folder = entry.file_name();
        let mut attributed: Vec<String> = agents::AGENT_LAYOUTS
            .iter()
            .filter(|agent| installed_agents.contains(&agent.id))
            .filter(|agent| {
                let path = agents::agent_skills_dir(agent, &scope_root).join(&folder);
                std::fs::symlink_metadata(path).is_ok()
            })
            .map(|agent| agent.id.to_string())
            .collect();

        if let Some(filter) = agent_filter {
            attributed.retain(|id| filter.iter().any(|want| want.eq_ignore_ascii_case(id)));
            if attributed.is_empty() {
                continue;
            }
        }

        results.push(InstalledSkill {
            name: doc.name,
            description: doc.description,
            path: dir,
            scope,
            agents: attributed,
        });
    }

    Ok(results)
}

/// Remove an installed skill folder from the canonical directory and from
/// every agent directory in the scope. Returns the agent ids it was
/// detached from.
pub async fn remove_skill_dirs(
    folder: &str,
    is_global: bool,
    cwd: &Path,
    agent_filter: Option<&[String]>,
) -> anyhow::Result<Vec<&'static str>> {
    let scope_root = skillpack_config::scope_root(is_global, cwd);
    let canonical = skillpack_config::canonical_skills_dir(is_global, cwd).join(folder);

    let mut removed = Vec::new();
    for agent in agents::AGENT_LAYOUTS {
        if let Some(filter) = agent_filter
            && !filter.iter().any(|want| want.eq_ignore_ascii_case(agent.id))
        {
            continue;
        }
        let path = agents::agent_skills_dir(agent, &scope_root).join(folder);
        if path == canonical {
            continue;
        }
        if tokio::fs::symlink_metadata(&path).await.is_ok() {
            remove_existing(&path).await?;
            removed.push(agent.id);
        }
    }

    // The canonical copy only goes away when removal isn't agent-scoped.
    if agent_filter.is_none() && tokio::fs::symlink_metadata(&canonical).await.is_ok() {
        remove_existing(&canonical).await?;
    }

    Ok(removed)
}

// ── Filesystem helpers ──────────────────────────────────────────────────────

/// Copy the skill source directory into the canonical location, replacing
/// prior content.
async fn stage_skill(skill: &Skill, canonical: &Path) -> anyhow::Result<()> {
    if let (Ok(src), Ok(dst)) = (
        tokio::fs::canonicalize(&skill.path).await,
        tokio::fs::canonicalize(canonical).await,
    ) && src == dst
    {
        return Ok(());
    }

    if tokio::fs::symlink_metadata(canonical).await.is_ok() {
        remove_existing(canonical).await?;
    }
    tokio::fs::create_dir_all(canonical)
        .await
        .with_context(|| format!("failed to create {}", canonical.display()))?;
    copy_dir_recursive(&skill.path, canonical).await
}

/// Delete a symlink at `path` that resolves to itself or to nothing — the
/// leftover of a corrupted prior install.
async fn remove_corrupt_symlink(path: &Path) -> anyhow::Result<()> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(_) => return Ok(()),
    };
    if !meta.file_type().is_symlink() {
        return Ok(());
    }

    let target = tokio::fs::read_link(path).await?;
    let resolved = if target.is_absolute() {
        target
    } else {
        path.parent().map(|p| p.join(&target)).unwrap_or(target)
    };
    let is_self_loop = resolved == *path;
    let is_dangling = tokio::fs::canonicalize(path).await.is_err();
    if is_self_loop || is_dangling {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("failed to remove corrupt symlink {}", path.display()))?;
    }
    Ok(())
}

/// Remove whatever sits at `path`: symlink, directory, or file.
async fn remove_existing(path: &Path) -> anyhow::Result<()> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(_) => return Ok(()),
    };
    if meta.file_type().is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

async fn copy_dir_recursive(src: &Path, dst: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dst).await?;
    let mut entries = tokio::fs::read_dir(src).await?;
    while let Some(entry) = entries.next_entry().await? {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            Box::pin(copy_dir_recursive(&src_path, &dst_path)).await?;
        } else {
            tokio::fs::copy(&src_path, &dst_path).await?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
