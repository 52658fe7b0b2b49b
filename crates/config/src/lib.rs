//! Path resolution shared by all skillpack crates.
//!
//! Installed skills live in a shared `.agents/skills/` directory under either
//! the project working directory or the user's home directory, depending on
//! scope. The lock file always lives in the home-level `.agents/` directory.

use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Directory holding shared skill state, under home or a project root.
pub const AGENTS_DIR: &str = ".agents";

/// Subdirectory of [`AGENTS_DIR`] holding canonical skill folders.
pub const SKILLS_SUBDIR: &str = "skills";

/// File name of the lock file inside the home-level [`AGENTS_DIR`].
pub const LOCK_FILE: &str = ".skill-lock.json";

static HOME_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Override the home directory (used by tests to isolate global state).
pub fn set_home_dir(path: PathBuf) {
    if let Ok(mut guard) = HOME_OVERRIDE.write() {
        *guard = Some(path);
    }
}

/// Clear a previously set home directory override.
pub fn clear_home_dir() {
    if let Ok(mut guard) = HOME_OVERRIDE.write() {
        *guard = None;
    }
}

/// The user's home directory, honoring any test override.
pub fn home_dir() -> PathBuf {
    if let Ok(guard) = HOME_OVERRIDE.read()
        && let Some(path) = guard.as_ref()
    {
        return path.clone();
    }
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Root directory for a scope: the home dir for global installs, the
/// project working directory otherwise.
pub fn scope_root(is_global: bool, cwd: &Path) -> PathBuf {
    if is_global {
        home_dir()
    } else {
        cwd.to_path_buf()
    }
}

/// The canonical shared skills directory for a scope:
/// `<scope>/.agents/skills`.
pub fn canonical_skills_dir(is_global: bool, cwd: &Path) -> PathBuf {
    scope_root(is_global, cwd).join(AGENTS_DIR).join(SKILLS_SUBDIR)
}

/// Path of the global lock file: `~/.agents/.skill-lock.json`.
pub fn skill_lock_path() -> PathBuf {
    home_dir().join(AGENTS_DIR).join(LOCK_FILE)
}
