//! The `find` command: non-interactive search against the hosted index.

use serde::Deserialize;

/// Hosted search API base.
pub const SEARCH_API_BASE: &str = "https://skills.sh";

/// A skill from the search API.
#[derive(Debug, Clone)]
pub struct SearchSkill {
    pub name: String,
    pub slug: String,
    pub source: String,
    pub installs: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    skills: Vec<RawSearchSkill>,
}

#[derive(Deserialize)]
struct RawSearchSkill {
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: String,
    #[serde(default, rename = "topSource")]
    top_source: Option<String>,
    #[serde(default)]
    installs: u64,
}

/// Query the search API. Any failure is an empty result list, never an
/// error surfaced to the user.
pub async fn search_skills(
    client: &reqwest::Client,
    api_base: &str,
    query: &str,
    limit: usize,
) -> Vec<SearchSkill> {
    let limit = limit.to_string();
    let response = match client
        .get(format!("{api_base}/api/search"))
        .query(&[("q", query), ("limit", limit.as_str())])
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        _ => return Vec::new(),
    };
    let Ok(parsed) = response.json::<SearchResponse>().await else {
        return Vec::new();
    };

    parsed
        .skills
        .into_iter()
        .map(|raw| SearchSkill {
            name: raw.name,
            slug: raw.id,
            source: raw.top_source.unwrap_or_default(),
            installs: raw.installs,
        })
        .collect()
}

pub async fn run_find(query: Option<String>) -> anyhow::Result<()> {
    let Some(query) = query else {
        println!("Usage: skillpack find <query>");
        println!("Then install a result with `skillpack add <owner/repo@skill>`.");
        return Ok(());
    };

    let client = crate::http_client()?;
    let results = search_skills(&client, SEARCH_API_BASE, &query, 10).await;

    if results.is_empty() {
        println!("No skills found for \"{query}\"");
        return Ok(());
    }

    println!("Install with: skillpack add <owner/repo@skill>");
    println!();
    for skill in results.iter().take(6) {
        let package = if skill.source.is_empty() { &skill.slug } else { &skill.source };
        println!("{package}@{}", skill.name);
        println!("  https://skills.sh/{package}/{}", skill.slug);
    }
    Ok(())
}
