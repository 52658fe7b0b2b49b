//! Skill acquisition and installation pipeline.
//!
//! Skills are directories containing a `SKILL.md` file with YAML frontmatter
//! and markdown instructions. This crate resolves a user-supplied source
//! string into a structured reference, fetches skill documents from remote
//! hosts or local trees, installs them into per-agent directories (symlink
//! or copy), and records provenance in a lock file for update checks.

pub mod agents;
pub mod discover;
pub mod fetch;
pub mod install;
pub mod lock;
pub mod parse;
pub mod providers;
pub mod source;
pub mod types;
pub mod update;
