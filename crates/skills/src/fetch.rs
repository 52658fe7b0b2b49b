//! Materialize a source reference into a local directory tree.
//!
//! GitHub and GitLab sources are fetched as tarballs over HTTP and unpacked
//! with archive-path sanitization; other git remotes go through the `git`
//! binary. One hop of retrieval per source, no retries.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};

use crate::source::{SourceKind, SourceRef, get_owner_repo};

/// A fetched source tree. Remote fetches own their temp directory, which is
/// removed on drop.
pub struct FetchedTree {
    pub root: PathBuf,
    _temp: Option<tempfile::TempDir>,
}

impl FetchedTree {
    fn local(root: PathBuf) -> Self {
        Self { root, _temp: None }
    }

    fn temporary(temp: tempfile::TempDir) -> Self {
        Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        }
    }
}

/// Fetch the tree behind a source reference. `cwd` anchors relative local
/// paths. Direct URLs are provider territory and are rejected here.
pub async fn fetch_source_tree(
    client: &reqwest::Client,
    source: &SourceRef,
    cwd: &Path,
) -> anyhow::Result<FetchedTree> {
    match source.kind {
        SourceKind::Local => {
            let raw = source
                .local_path
                .as_deref()
                .context("local source is missing its path")?;
            let path = PathBuf::from(raw);
            let root = if path.is_absolute() { path } else { cwd.join(path) };
            if !root.is_dir() {
                bail!("local path does not exist: {}", root.display());
            }
            Ok(FetchedTree::local(root))
        },
        SourceKind::GitHub => {
            let owner_repo = get_owner_repo(source).context("unparseable GitHub source")?;
            let temp = tempfile::tempdir()?;
            fetch_github_tarball(client, &owner_repo, source.git_ref.as_deref(), temp.path())
                .await?;
            Ok(FetchedTree::temporary(temp))
        },
        SourceKind::GitLab => {
            let owner_repo = get_owner_repo(source).context("unparseable GitLab source")?;
            let temp = tempfile::tempdir()?;
            fetch_gitlab_tarball(client, &owner_repo, source.git_ref.as_deref(), temp.path())
                .await?;
            Ok(FetchedTree::temporary(temp))
        },
        SourceKind::Git => {
            let url = source.url.as_deref().context("git source is missing its URL")?;
            let temp = tempfile::tempdir()?;
            git_clone(url, source.git_ref.as_deref(), temp.path()).await?;
            Ok(FetchedTree::temporary(temp))
        },
        SourceKind::DirectUrl => {
            bail!("direct URLs are fetched through providers, not cloned")
        },
    }
}

async fn fetch_github_tarball(
    client: &reqwest::Client,
    owner_repo: &str,
    git_ref: Option<&str>,
    target: &Path,
) -> anyhow::Result<()> {
    let candidates: Vec<String> = match git_ref {
        Some(git_ref) => {
            vec![format!("https://codeload.github.com/{owner_repo}/tar.gz/{git_ref}")]
        },
        None => vec![
            format!("https://codeload.github.com/{owner_repo}/tar.gz/main"),
            format!("https://codeload.github.com/{owner_repo}/tar.gz/master"),
            // Redirects to the default branch whatever its name.
            format!("https://api.github.com/repos/{owner_repo}/tarball"),
        ],
    };

    for url in &candidates {
        match download_and_unpack(client, url, target).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!(%url, %e, "tarball candidate failed"),
        }
    }
    bail!("failed to fetch {owner_repo} from GitHub")
}

async fn fetch_gitlab_tarball(
    client: &reqwest::Client,
    owner_repo: &str,
    git_ref: Option<&str>,
    target: &Path,
) -> anyhow::Result<()> {
    let refs: Vec<&str> = match git_ref {
        Some(git_ref) => vec![git_ref],
        None => vec!["main", "master"],
    };

    for r in refs {
        let url = format!("https://gitlab.com/{owner_repo}/-/archive/{r}/archive.tar.gz");
        match download_and_unpack(client, &url, target).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!(%url, %e, "archive candidate failed"),
        }
    }
    bail!("failed to fetch {owner_repo} from GitLab")
}

/// Download a gzipped tarball and unpack it into `target`, stripping the
/// leading archive component. Symlink and hardlink entries are skipped, and
/// entries that would escape the target directory are rejected.
async fn download_and_unpack(
    client: &reqwest::Client,
    url: &str,
    target: &Path,
) -> anyhow::Result<()> {
    let response = client
        .get(url)
        .header("User-Agent", "skillpack")
        .send()
        .await?;
    if !response.status().is_success() {
        bail!("HTTP {} for {url}", response.status());
    }
    let bytes = response.bytes().await?;

    tokio::fs::create_dir_all(target).await?;
    let target = target.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let canonical_target = std::fs::canonicalize(&target)?;
        let decoder = flate2::read::GzDecoder::new(&bytes[..]);
        let mut archive = tar::Archive::new(decoder);
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type().is_symlink() || entry.header().entry_type().is_hard_link()
            {
                tracing::warn!("skipping symlink/hardlink archive entry");
                continue;
            }

            let path = entry.path()?.into_owned();
            let Some(stripped) = sanitize_archive_path(&path)? else {
                continue;
            };

            let dest = target.join(&stripped);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
                let canonical_parent = std::fs::canonicalize(parent)?;
                if !canonical_parent.starts_with(&canonical_target) {
                    bail!("archive entry escaped the target directory");
                }
            }

            if entry.header().entry_type().is_dir() {
                std::fs::create_dir_all(&dest)?;
                continue;
            }
            entry.unpack(&dest)?;
        }
        Ok::<(), anyhow::Error>(())
    })
    .await??;

    Ok(())
}

/// Strip the tarball's single leading component and reject unsafe paths.
fn sanitize_archive_path(path: &Path) -> anyhow::Result<Option<PathBuf>> {
    let stripped: PathBuf = path.components().skip(1).collect();
    if stripped.as_os_str().is_empty() {
        return Ok(None);
    }

    for component in stripped.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("archive contains unsafe path component: {}", path.display());
            },
        }
    }

    Ok(Some(stripped))
}

/// Shallow-clone a generic git remote. The `git` binary is an external
/// collaborator; its absence is reported, not papered over.
async fn git_clone(url: &str, git_ref: Option<&str>, target: &Path) -> anyhow::Result<()> {
    let mut cmd = tokio::process::Command::new("git");
    cmd.arg("clone").arg("--depth").arg("1");
    if let Some(git_ref) = git_ref {
        cmd.arg("--branch").arg(git_ref);
    }
    cmd.arg(url).arg(target);

    let status = cmd
        .status()
        .await
        .context("failed to run git; is it installed?")?;
    if !status.success() {
        bail!("git clone failed for {url}");
    }
    Ok(())
}
