//! Agent directory layouts and installed-agent detection.
//!
//! Each supported coding agent keeps skills in its own directory relative to
//! the scope root. Several agents share the `.agents/skills` convention, so
//! a skill physically present there is only attributed to agents that are
//! actually detected on the system.

use std::path::{Path, PathBuf};

/// Where one agent keeps its skills, and how to detect its installation.
#[derive(Debug, Clone, Copy)]
pub struct AgentLayout {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Skills directory relative to the scope root.
    pub skills_dir: &'static str,
    /// Config directory probed under home to detect an installation.
    pub marker_dir: &'static str,
    /// Binary probed on PATH to detect an installation.
    pub binary: &'static str,
}

/// Supported agents, in display order.
pub const AGENT_LAYOUTS: &[AgentLayout] = &[
    AgentLayout {
        id: "amp",
        display_name: "Amp",
        skills_dir: ".agents/skills",
        marker_dir: ".amp",
        binary: "amp",
    },
    AgentLayout {
        id: "claude-code",
        display_name: "Claude Code",
        skills_dir: ".claude/skills",
        marker_dir: ".claude",
        binary: "claude",
    },
    AgentLayout {
        id: "cline",
        display_name: "Cline",
        skills_dir: ".cline/skills",
        marker_dir: ".cline",
        binary: "cline",
    },
    AgentLayout {
        id: "codex",
        display_name: "Codex",
        skills_dir: ".codex/skills",
        marker_dir: ".codex",
        binary: "codex",
    },
    AgentLayout {
        id: "copilot",
        display_name: "GitHub Copilot",
        skills_dir: ".github/skills",
        marker_dir: ".copilot",
        binary: "copilot",
    },
    AgentLayout {
        id: "cursor",
        display_name: "Cursor",
        skills_dir: ".cursor/skills",
        marker_dir: ".cursor",
        binary: "cursor-agent",
    },
    AgentLayout {
        id: "gemini",
        display_name: "Gemini CLI",
        skills_dir: ".gemini/skills",
        marker_dir: ".gemini",
        binary: "gemini",
    },
    AgentLayout {
        id: "goose",
        display_name: "Goose",
        skills_dir: ".goose/skills",
        marker_dir: ".config/goose",
        binary: "goose",
    },
    AgentLayout {
        id: "kimi-cli",
        display_name: "Kimi CLI",
        skills_dir: ".agents/skills",
        marker_dir: ".kimi",
        binary: "kimi",
    },
    AgentLayout {
        id: "opencode",
        display_name: "opencode",
        skills_dir: ".opencode/skill",
        marker_dir: ".opencode",
        binary: "opencode",
    },
    AgentLayout {
        id: "windsurf",
        display_name: "Windsurf",
        skills_dir: ".windsurf/skills",
        marker_dir: ".codeium/windsurf",
        binary: "windsurf",
    },
];

/// Look up an agent layout by id.
pub fn find_agent(id: &str) -> Option<&'static AgentLayout> {
    AGENT_LAYOUTS.iter().find(|agent| agent.id == id)
}

/// All known agent ids.
pub fn all_agent_ids() -> Vec<&'static str> {
    AGENT_LAYOUTS.iter().map(|agent| agent.id).collect()
}

/// Skills directory of one agent under a scope root.
pub fn agent_skills_dir(agent: &AgentLayout, scope_root: &Path) -> PathBuf {
    scope_root.join(agent.skills_dir)
}

/// Agents detected as installed on this system: a config directory under
/// home or a binary on PATH counts as installed.
pub fn detect_installed_agents() -> Vec<&'static str> {
    let home = skillpack_config::home_dir();
    AGENT_LAYOUTS
        .iter()
        .filter(|agent| home.join(agent.marker_dir).is_dir() || which::which(agent.binary).is_ok())
        .map(|agent| agent.id)
        .collect()
}
