//! The `init` command: scaffold a new skill document.

use anyhow::bail;

use skillpack_skills::install::sanitize_name;

pub fn run_init(name: Option<String>) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(|| "my-skill".to_string());
    let folder = sanitize_name(&name);

    let dir = std::env::current_dir()?.join(&folder);
    let doc = dir.join("SKILL.md");
    if doc.exists() {
        bail!("{} already exists", doc.display());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&doc, template(&folder))?;

    println!("Created {}", doc.display());
    println!("Edit the description so agents know when to reach for it.");
    Ok(())
}

fn template(name: &str) -> String {
    format!(
        "---\nname: {name}\ndescription: Describe when an agent should use this skill.\n---\n\n# {name}\n\nWrite the instructions for the agent here.\n"
    )
}
