//! Mintlify documentation-site provider.
//!
//! Mintlify sites expose `skill.md` documents directly as raw content, so
//! matching is by suffix alone, minus the hosts that have dedicated
//! providers.

use async_trait::async_trait;

use {
    super::{
        EXCLUDED_GIT_HOSTS, HostProvider, ProviderMatch, RemoteSkill, install_name_from_display,
        is_http_url, url_host,
    },
    crate::{discover::SKILL_FILE, parse},
};

pub struct MintlifyProvider;

#[async_trait]
impl HostProvider for MintlifyProvider {
    fn id(&self) -> &'static str {
        "mintlify"
    }

    fn display_name(&self) -> &'static str {
        "Mintlify"
    }

    fn matches(&self, url: &str) -> ProviderMatch {
        if !is_http_url(url) || !url.to_lowercase().ends_with("/skill.md") {
            return ProviderMatch::none();
        }
        let Some(host) = url_host(url) else {
            return ProviderMatch::none();
        };
        if EXCLUDED_GIT_HOSTS.contains(&host.as_str()) {
            return ProviderMatch::none();
        }
        ProviderMatch::matched(self.source_identifier(url))
    }

    fn to_raw_url(&self, url: &str) -> String {
        url.to_string()
    }

    fn source_identifier(&self, url: &str) -> String {
        match url_host(url) {
            Some(host) => format!("mintlify/{host}"),
            None => "mintlify/com".to_string(),
        }
    }

    async fn fetch_skill(&self, client: &reqwest::Client, url: &str) -> Option<RemoteSkill> {
        let response = client.get(url).send().await.ok()?;
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

        let install_name = parse::nested_metadata_string(&doc.metadata, "mintlify-proj")
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
    fn matches_skill_md_url() {
        let result = MintlifyProvider.matches("https://docs.example.com/api/skill.md");
        assert!(result.matches);
        assert_eq!(result.source_identifier.as_deref(), Some("mintlify/docs.example.com"));
    }

    #[test]
    fn matches_case_insensitive_suffix() {
        assert!(MintlifyProvider.matches("https://docs.example.com/api/SKILL.MD").matches);
    }

    #[test]
    fn rejects_excluded_git_hosts() {
        assert!(!MintlifyProvider.matches("https://github.com/owner/repo/skill.md").matches);
        assert!(!MintlifyProvider.matches("https://gitlab.com/owner/repo/skill.md").matches);
        assert!(
            !MintlifyProvider
                .matches("https://huggingface.co/spaces/owner/repo/skill.md")
                .matches
        );
    }

    #[test]
    fn rejects_non_skill_md_and_non_http() {
        assert!(!MintlifyProvider.matches("https://docs.example.com/api/readme.md").matches);
        assert!(!MintlifyProvider.matches("git@github.com:owner/repo.git").matches);
    }

    #[test]
    fn raw_url_is_identity() {
        let url = "https://docs.example.com/api/skill.md";
        assert_eq!(MintlifyProvider.to_raw_url(url), url);
    }

    #[test]
    fn source_identifier_uses_host() {
        assert_eq!(
            MintlifyProvider.source_identifier("https://docs.bun.sh/api/skill.md"),
            "mintlify/docs.bun.sh"
        );
    }

    #[tokio::test]
    async fn fetch_derives_install_name_from_display_name() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/skill.md")
            .with_status(200)
            .with_body("---\nname: Convex Best Practices\ndescription: Convex guidance\n---\nBody.\n")
            .create_async()
            .await;

        let url = format!("{}/api/skill.md", server.url());
        let skill = MintlifyProvider
            .fetch_skill(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(skill.install_name, "convex-best-practices");
        assert_eq!(skill.source_url, url);
    }

    #[tokio::test]
    async fn fetch_honors_mintlify_proj_override() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/skill.md")
            .with_status(200)
            .with_body(
                "---\nname: Bun Docs\ndescription: Bun documentation\nmetadata:\n  mintlify-proj: bun.sh\n---\nBody.\n",
            )
            .create_async()
            .await;

        let url = format!("{}/api/skill.md", server.url());
        let skill = MintlifyProvider
            .fetch_skill(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(skill.install_name, "bun.sh");
    }

    #[tokio::test]
    async fn fetch_malformed_document_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/skill.md")
            .with_status(200)
            .with_body("# Not a skill document\n")
            .create_async()
            .await;

        let url = format!("{}/api/skill.md", server.url());
        assert!(MintlifyProvider.fetch_skill(&reqwest::Client::new(), &url).await.is_none());
    }
}
