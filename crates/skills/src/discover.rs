//! Filesystem skill discovery.
//!
//! Walks a local tree (a clone or a user-supplied path) and locates skill
//! documents by the `SKILL.md` filename convention. A root-level document
//! short-circuits the walk by default: large repositories with a top-level
//! skill stay cheap to scan.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{parse, types::Skill};

/// Skill document filename.
pub const SKILL_FILE: &str = "SKILL.md";

/// Directories never descended into during discovery.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Discover skill documents under `root`.
///
/// A root-level `SKILL.md` is always included. With `full_depth` false
/// (the default posture) a present root document ends the search; otherwise
/// every subdirectory — including hidden curated ones like
/// `skills/.curated/` — is walked and each valid document collected.
/// Duplicate names keep the first occurrence, so the root document wins
/// over nested ones. Invalid documents are skipped, not fatal.
pub async fn discover_skills(root: &Path, full_depth: bool) -> anyhow::Result<Vec<Skill>> {
    let mut skills: Vec<Skill> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let root_doc = root.join(SKILL_FILE);
    if root_doc.is_file() {
        if let Some(skill) = read_skill(&root_doc).await {
            seen.insert(skill.name.clone());
            skills.push(skill);
        }
        if !full_depth && !skills.is_empty() {
            return Ok(skills);
        }
    }

    let mut dirs: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        while let Some(entry) = entries.next_entry().await? {
            let subdir = entry.path();
            if !subdir.is_dir() {
                continue;
            }
            if let Some(name) = subdir.file_name().and_then(|n| n.to_str())
                && SKIPPED_DIRS.contains(&name)
            {
                continue;
            }
            let doc = subdir.join(SKILL_FILE);
            if doc.is_file() {
                if let Some(skill) = read_skill(&doc).await
                    && seen.insert(skill.name.clone())
                {
                    skills.push(skill);
                }
            } else {
                dirs.push(subdir);
            }
        }
    }

    Ok(skills)
}

/// Keep the skills whose declared name exactly matches one of the requested
/// names, case-insensitively. Each name is matched as a whole token:
/// multi-word names must arrive as a single token.
pub fn filter_skills(skills: &[Skill], names: &[String]) -> Vec<Skill> {
    skills
        .iter()
        .filter(|skill| names.iter().any(|name| name.eq_ignore_ascii_case(&skill.name)))
        .cloned()
        .collect()
}

async fn read_skill(doc_path: &Path) -> Option<Skill> {
    let content = match tokio::fs::read_to_string(doc_path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(?doc_path, %e, "skipping unreadable SKILL.md");
            return None;
        },
    };
    match parse::parse_skill_doc(&content) {
        Ok(doc) => Some(Skill {
            name: doc.name,
            description: doc.description,
            path: doc_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            content,
        }),
        Err(e) => {
            tracing::debug!(?doc_path, %e, "skipping non-conforming SKILL.md");
            None
        },
    }
}
