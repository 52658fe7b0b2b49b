//! Update-check client.
//!
//! Installed skills with a known folder hash are posted to the hosted
//! check-updates endpoint, which compares hashes against the current source
//! trees and reports which skills changed.

use {
    anyhow::bail,
    serde::{Deserialize, Serialize},
};

use crate::lock::SkillLockFile;

/// Hosted update-check endpoint.
pub const CHECK_UPDATES_URL: &str = "https://add-skill.vercel.sh/check-updates";

/// One skill in an update-check request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSkill {
    pub name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub skill_folder_hash: String,
}

#[derive(Serialize)]
struct CheckRequest {
    skills: Vec<CheckSkill>,
}

/// A skill the service reports as changed.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillUpdate {
    pub name: String,
    #[serde(default)]
    pub source: String,
}

/// Update-check response. Unknown error payloads are kept opaque.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub updates: Vec<SkillUpdate>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// Lock entries eligible for an update check: only skills that recorded a
/// folder hash at install time can be compared.
pub fn check_candidates(lock: &SkillLockFile) -> Vec<CheckSkill> {
    lock.skills
        .iter()
        .filter(|(_, entry)| !entry.skill_folder_hash.is_empty())
        .map(|(name, entry)| CheckSkill {
            name: name.clone(),
            source: entry.source.clone(),
            path: entry.skill_path.clone(),
            skill_folder_hash: entry.skill_folder_hash.clone(),
        })
        .collect()
}

/// Post eligible skills to the check-updates service.
pub async fn check_for_updates(
    client: &reqwest::Client,
    endpoint: &str,
    skills: Vec<CheckSkill>,
) -> anyhow::Result<CheckResponse> {
    let response = client
        .post(endpoint)
        .json(&CheckRequest { skills })
        .send()
        .await?;
    if !response.status().is_success() {
        bail!("update check failed: HTTP {}", response.status());
    }
    Ok(response.json::<CheckResponse>().await?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::lock::{SkillLockEntry, SkillLockFile},
    };

    fn lock_with(entries: &[(&str, &str)]) -> SkillLockFile {
        let mut lock = SkillLockFile::default();
        for (name, hash) in entries {
            lock.skills.insert(
                (*name).to_string(),
                SkillLockEntry {
                    source: "owner/repo".to_string(),
                    source_type: "github".to_string(),
                    source_url: "https://github.com/owner/repo.git".to_string(),
                    skill_folder_hash: (*hash).to_string(),
                    skill_path: Some("skills/demo/SKILL.md".to_string()),
                    installed_at: "t".to_string(),
                    updated_at: "t".to_string(),
                },
            );
        }
        lock
    }

    #[test]
    fn candidates_require_a_folder_hash() {
        let lock = lock_with(&[("hashed", "abc"), ("unhashed", "")]);
        let candidates = check_candidates(&lock);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "hashed");
        assert_eq!(candidates[0].skill_folder_hash, "abc");
    }

    #[tokio::test]
    async fn check_posts_camel_case_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/check-updates")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"skills":[{"name":"demo","source":"owner/repo","skillFolderHash":"abc"}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "updates": [{"name": "demo", "source": "owner/repo"}],
                    "errors": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let endpoint = format!("{}/check-updates", server.url());
        let candidates = check_candidates(&lock_with(&[("demo", "abc")]));
        let response = check_for_updates(&client, &endpoint, candidates).await.unwrap();

        assert_eq!(response.updates.len(), 1);
        assert_eq!(response.updates[0].name, "demo");
        assert!(response.errors.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/check-updates")
            .with_status(500)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let endpoint = format!("{}/check-updates", server.url());
        let result = check_for_updates(&client, &endpoint, Vec::new()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }
}
