//! HuggingFace Spaces provider.

use async_trait::async_trait;

use {
    super::{HostProvider, ProviderMatch, RemoteSkill, install_name_from_display, is_http_url, url_host},
    crate::{discover::SKILL_FILE, parse},
};

pub struct HuggingFaceProvider;

impl HuggingFaceProvider {
    /// Parse `(owner, repo)` from a `/spaces/{owner}/{repo}/...` URL.
    fn parse_spaces_url(url: &str) -> Option<(String, String)> {
        let idx = url.find("/spaces/")?;
        let mut segments = url[idx + "/spaces/".len()..].split('/');
        let owner = segments.next().filter(|s| !s.is_empty())?;
        let repo = segments.next().filter(|s| !s.is_empty())?;
        Some((owner.to_string(), repo.to_string()))
    }
}

#[async_trait]
impl HostProvider for HuggingFaceProvider {
    fn id(&self) -> &'static str {
        "huggingface"
    }

    fn display_name(&self) -> &'static str {
        "HuggingFace"
    }

    fn matches(&self, url: &str) -> ProviderMatch {
        if !is_http_url(url) {
            return ProviderMatch::none();
        }
        if url_host(url).as_deref() != Some("huggingface.co") {
            return ProviderMatch::none();
        }
        if !url.contains("/spaces/") || !url.to_lowercase().ends_with("/skill.md") {
            return ProviderMatch::none();
        }
        ProviderMatch::matched(self.source_identifier(url))
    }

    /// Blob URLs serve HTML; the raw path serves file content.
    fn to_raw_url(&self, url: &str) -> String {
        url.replace("/blob/", "/raw/")
    }

    fn source_identifier(&self, url: &str) -> String {
        match Self::parse_spaces_url(url) {
            Some((owner, repo)) => format!("huggingface/{owner}/{repo}"),
            None => "huggingface".to_string(),
        }
    }

    async fn fetch_skill(&self, client: &reqwest::Client, url: &str) -> Option<RemoteSkill> {
        let raw_url = self.to_raw_url(url);
        let response = client.get(&raw_url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content = response.text().await.ok()?;
        let doc = match parse::parse_skill_doc(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(%url, %e, "skill document rejected");
                return None;
            },
        };

        let install_name = parse::nested_metadata_string(&doc.metadata, "install-name")
            .or_else(|| Self::parse_spaces_url(url).map(|(_, repo)| repo))
            .unwrap_or_else(|| install_name_from_display(&doc.name));

        Some(RemoteSkill {
            name: doc.name,
            description: doc.description,
            content: content.clone(),
            install_name,
            source_url: url.to_string(),
            metadata: (!doc.metadata.is_empty()).then_some(doc.metadata),
            files: [(SKILL_FILE.to_string(), content)].into(),
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_spaces_skill_md() {
        let result =
            HuggingFaceProvider.matches("https://huggingface.co/spaces/owner/repo/blob/main/SKILL.md");
        assert!(result.matches);
        assert_eq!(result.source_identifier.as_deref(), Some("huggingface/owner/repo"));
    }

    #[test]
    fn matches_case_insensitive_suffix() {
        assert!(
            HuggingFaceProvider
                .matches("https://huggingface.co/spaces/owner/repo/blob/main/skill.md")
                .matches
        );
    }

    #[test]
    fn rejects_non_spaces_urls() {
        assert!(
            !HuggingFaceProvider
                .matches("https://huggingface.co/models/owner/repo/skill.md")
                .matches
        );
    }

    #[test]
    fn rejects_non_skill_md() {
        assert!(
            !HuggingFaceProvider
                .matches("https://huggingface.co/spaces/owner/repo/blob/main/README.md")
                .matches
        );
    }

    #[test]
    fn rejects_other_hosts_and_schemes() {
        assert!(!HuggingFaceProvider.matches("https://example.com/spaces/owner/repo/skill.md").matches);
        assert!(!HuggingFaceProvider.matches("git@github.com:owner/repo.git").matches);
    }

    #[test]
    fn raw_url_converts_blob() {
        assert_eq!(
            HuggingFaceProvider.to_raw_url("https://huggingface.co/spaces/owner/repo/blob/main/SKILL.md"),
            "https://huggingface.co/spaces/owner/repo/raw/main/SKILL.md"
        );
    }

    #[test]
    fn source_identifier_includes_owner_repo() {
        assert_eq!(
            HuggingFaceProvider
                .source_identifier("https://huggingface.co/spaces/my-org/my-skills/blob/main/SKILL.md"),
            "huggingface/my-org/my-skills"
        );
    }

    #[tokio::test]
    async fn fetch_parses_frontmatter_and_derives_install_name() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/spaces/owner/repo/raw/main/SKILL.md")
            .with_status(200)
            .with_body("---\nname: Demo Skill\ndescription: A demo\n---\nBody.\n")
            .create_async()
            .await;

        // Exercise the raw-path fetch directly against the mock server.
        let url = format!("{}/spaces/owner/repo/blob/main/SKILL.md", server.url());
        let skill = HuggingFaceProvider
            .fetch_skill(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(skill.name, "Demo Skill");
        // Repo name wins over the lowercased display name.
        assert_eq!(skill.install_name, "repo");
        assert_eq!(skill.files.len(), 1);
    }

    #[tokio::test]
    async fn fetch_honors_install_name_override() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/spaces/owner/repo/raw/main/SKILL.md")
            .with_status(200)
            .with_body(
                "---\nname: Demo Skill\ndescription: A demo\nmetadata:\n  install-name: custom-name\n---\nBody.\n",
            )
            .create_async()
            .await;

        let url = format!("{}/spaces/owner/repo/blob/main/SKILL.md", server.url());
        let skill = HuggingFaceProvider
            .fetch_skill(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(skill.install_name, "custom-name");
    }

    #[tokio::test]
    async fn fetch_missing_required_fields_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/spaces/owner/repo/raw/main/SKILL.md")
            .with_status(200)
            .with_body("---\nname: only-name\n---\nBody.\n")
            .create_async()
            .await;

        let url = format!("{}/spaces/owner/repo/blob/main/SKILL.md", server.url());
        let skill = HuggingFaceProvider.fetch_skill(&reqwest::Client::new(), &url).await;
        assert!(skill.is_none());
    }

    #[tokio::test]
    async fn fetch_non_200_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/spaces/owner/repo/raw/main/SKILL.md")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/spaces/owner/repo/blob/main/SKILL.md", server.url());
        let skill = HuggingFaceProvider.fetch_skill(&reqwest::Client::new(), &url).await;
        assert!(skill.is_none());
    }
}
