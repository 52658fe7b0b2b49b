use std::collections::BTreeMap;

use {
    anyhow::{Context, bail},
    serde::Deserialize,
};

/// A parsed `SKILL.md` document: required frontmatter fields, any extra
/// frontmatter keys, and the markdown body.
#[derive(Debug, Clone)]
pub struct SkillDoc {
    pub name: String,
    pub description: String,
    /// Frontmatter keys other than `name`/`description`.
    pub metadata: BTreeMap<String, serde_yaml::Value>,
    pub body: String,
}

#[derive(Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

/// Parse a `SKILL.md` document. Fails when the frontmatter block is missing,
/// malformed, or lacks a non-empty `name`/`description`.
pub fn parse_skill_doc(content: &str) -> anyhow::Result<SkillDoc> {
    let (frontmatter, body) = split_frontmatter(content)?;
    let raw: RawFrontmatter =
        serde_yaml::from_str(&frontmatter).context("invalid SKILL.md frontmatter")?;

    let name = raw.name.unwrap_or_default();
    let description = raw.description.unwrap_or_default();
    if name.trim().is_empty() || description.trim().is_empty() {
        bail!("SKILL.md frontmatter must declare name and description");
    }

    Ok(SkillDoc {
        name,
        description,
        metadata: raw.extra,
        body,
    })
}

/// Look up a string value inside the nested `metadata` frontmatter mapping,
/// e.g. `metadata.install-name` for HuggingFace installs.
pub fn nested_metadata_string(
    metadata: &BTreeMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<String> {
    metadata
        .get("metadata")?
        .get(key)?
        .as_str()
        .map(ToOwned::to_owned)
}

/// Split document content at `---` delimiters into (frontmatter, body).
fn split_frontmatter(content: &str) -> anyhow::Result<(String, String)> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        bail!("SKILL.md must start with YAML frontmatter delimited by ---");
    }

    let after_open = &trimmed[3..];
    let close_pos = after_open
        .find("\n---")
        .context("SKILL.md missing closing --- for frontmatter")?;

    let frontmatter = after_open[..close_pos].trim().to_string();
    let body = after_open[close_pos + 4..].trim().to_string();
    Ok((frontmatter, body))
}
