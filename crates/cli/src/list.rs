//! The `list` command.

use skillpack_skills::install;

pub async fn run_list(is_global: bool, agent_filter: Vec<String>) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let filter = (!agent_filter.is_empty()).then_some(agent_filter);
    let skills = install::list_installed_skills(is_global, &cwd, filter.as_deref()).await?;

    if skills.is_empty() {
        println!("No skills installed.");
        println!("Install one with `skillpack add <owner/repo>`.");
        return Ok(());
    }

    for skill in &skills {
        let agents = if skill.agents.is_empty() {
            String::new()
        } else {
            format!(" [{}]", skill.agents.join(", "))
        };
        println!("  {} — {} ({}){agents}", skill.name, skill.description, skill.scope);
    }
    Ok(())
}
