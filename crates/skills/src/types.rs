use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── Skills ───────────────────────────────────────────────────────────────────

/// A skill document located on the local filesystem.
#[derive(Debug, Clone)]
pub struct Skill {
    /// Display name from frontmatter.
    pub name: String,
    /// Short description from frontmatter.
    pub description: String,
    /// Directory containing the `SKILL.md` document.
    pub path: PathBuf,
    /// Full document text (frontmatter + body).
    pub content: String,
}

/// An installed skill found in the canonical shared directory, attributed to
/// the agents whose directories currently link to or copy it.
#[derive(Debug, Clone)]
pub struct InstalledSkill {
    pub name: String,
    pub description: String,
    /// Canonical skill directory.
    pub path: PathBuf,
    pub scope: Scope,
    /// Agent ids this skill is reachable from, among installed agents only.
    pub agents: Vec<String>,
}

/// Installation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Project,
    Global,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Global => write!(f, "global"),
        }
    }
}

// ── Installation ─────────────────────────────────────────────────────────────

/// How a skill is materialized into an agent directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Symlink the agent directory entry to the canonical shared copy.
    Symlink,
    /// Give the agent an independent full copy.
    Copy,
}

/// Outcome of installing one skill for one agent.
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub success: bool,
    /// Effective mode: a symlink install that fell back reports `Copy`.
    pub mode: InstallMode,
    /// Agent-facing path of the installed skill.
    pub path: PathBuf,
    /// Set when symlink creation failed and the install degraded to a copy.
    pub symlink_failed: bool,
    pub error: Option<String>,
}

impl InstallResult {
    pub(crate) fn failure(mode: InstallMode, error: impl Into<String>) -> Self {
        Self {
            success: false,
            mode,
            path: PathBuf::new(),
            symlink_failed: false,
            error: Some(error.into()),
        }
    }
}
