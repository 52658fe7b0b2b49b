//! The `remove` command: detach skills from agent directories and drop
//! their canonical copies and lock entries.

use anyhow::bail;

use skillpack_skills::{
    install::{self, sanitize_name},
    lock::LockStore,
    types::InstalledSkill,
};

pub struct RemoveOptions {
    pub skills: Vec<String>,
    pub is_global: bool,
    pub agents: Vec<String>,
    pub yes: bool,
    pub all: bool,
}

pub async fn run_remove(opts: RemoveOptions) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let store = LockStore::default_store();

    let installed = install::list_installed_skills(opts.is_global, &cwd, None).await?;
    let targets: Vec<InstalledSkill> = if opts.all {
        installed
    } else {
        if opts.skills.is_empty() {
            bail!("pass skill names to remove, or --all");
        }
        installed
            .into_iter()
            .filter(|skill| {
                opts.skills.iter().any(|name| {
                    name.eq_ignore_ascii_case(&skill.name)
                        || folder_name(skill).is_some_and(|folder| folder == sanitize_name(name))
                })
            })
            .collect()
    };

    if targets.is_empty() {
        println!("No matching installed skills.");
        return Ok(());
    }
    if !opts.yes {
        println!("Removing {} skill(s)...", targets.len());
    }

    let agent_filter = (!opts.agents.is_empty()).then(|| opts.agents.clone());
    for skill in &targets {
        let Some(folder) = folder_name(skill) else {
            continue;
        };
        install::remove_skill_dirs(&folder, opts.is_global, &cwd, agent_filter.as_deref())
            .await?;
        // Agent-scoped removal keeps the shared copy and its lock entry.
        if agent_filter.is_none() {
            store.remove_skill(&skill.name)?;
        }
        println!("  - {}", skill.name);
    }

    Ok(())
}

fn folder_name(skill: &InstalledSkill) -> Option<String> {
    skill
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}
