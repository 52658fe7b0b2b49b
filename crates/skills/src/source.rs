//! Source string classification.
//!
//! Turns an arbitrary user-supplied source string (shorthand, hosted URL,
//! SSH remote, local path) into a structured [`SourceRef`]. Pure string
//! work: no network or disk access, and no failure mode — ambiguous input
//! degrades to the most specific matching case.

/// Host class of a parsed source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    GitHub,
    GitLab,
    /// Any other git remote (SSH forms, custom hosts ending in `.git`).
    Git,
    /// Filesystem path.
    Local,
    /// Non-git http(s) URL, routed through the provider registry.
    DirectUrl,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Git => "git",
            Self::Local => "local",
            Self::DirectUrl => "direct-url",
        }
    }
}

/// A classified source reference. Created once per invocation, immutable.
///
/// For git-backed kinds `url` is canonical and ends in `.git`; for `Local`
/// only `local_path` is set, exactly as the user typed it (resolution
/// against the working directory is the caller's concern).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub url: Option<String>,
    pub git_ref: Option<String>,
    pub subpath: Option<String>,
    pub skill_filter: Option<String>,
    pub local_path: Option<String>,
}

impl SourceRef {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            url: None,
            git_ref: None,
            subpath: None,
            skill_filter: None,
            local_path: None,
        }
    }
}

/// Classify a source string. First match wins: local path, full hosted URL,
/// GitHub shorthand, direct URL, generic git remote.
pub fn parse_source(input: &str) -> SourceRef {
    let input = input.trim();

    if is_local_path(input) {
        let mut source = SourceRef::new(SourceKind::Local);
        source.local_path = Some(input.to_string());
        return source;
    }

    if let Some(source) = parse_hosted_url(input) {
        return source;
    }

    if !input.contains("://")
        && let Some(source) = parse_github_shorthand(input)
    {
        return source;
    }

    if (input.starts_with("https://") || input.starts_with("http://"))
        && !input.ends_with(".git")
        && !is_hosted_git_url(input)
    {
        let mut source = SourceRef::new(SourceKind::DirectUrl);
        source.url = Some(input.to_string());
        return source;
    }

    // SSH remotes, `.git` URLs on custom hosts, anything else.
    let mut source = SourceRef::new(SourceKind::Git);
    source.url = Some(input.to_string());
    source
}

/// Extract `"owner/repo"` from a GitHub/GitLab reference. Returns `None` for
/// every other kind: callers must not assume extraction succeeds.
pub fn get_owner_repo(source: &SourceRef) -> Option<String> {
    let prefix = match source.kind {
        SourceKind::GitHub => "https://github.com/",
        SourceKind::GitLab => "https://gitlab.com/",
        _ => return None,
    };
    let rest = source.url.as_deref()?.strip_prefix(prefix)?;
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut segments = rest.splitn(2, '/');
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(format!("{owner}/{repo}"))
}

fn is_local_path(input: &str) -> bool {
    input == "."
        || input == ".."
        || input.starts_with('/')
        || input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with(".\\")
        || input.starts_with("..\\")
        || has_drive_prefix(input)
}

/// Windows drive prefix such as `C:\` or `C:/`.
fn has_drive_prefix(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// An http(s) URL on a host that has a dedicated hosted-URL parse path.
fn is_hosted_git_url(input: &str) -> bool {
    strip_host(input, "github.com").is_some() || strip_host(input, "gitlab.com").is_some()
}

fn strip_host<'a>(input: &'a str, host: &str) -> Option<&'a str> {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = input.strip_prefix(scheme)
            && let Some(path) = rest.strip_prefix(host)
            && (path.is_empty() || path.starts_with('/'))
        {
            return Some(path.trim_start_matches('/'));
        }
    }
    None
}

/// Full `https://github.com/...` or `https://gitlab.com/...` URLs, with the
/// tree marker (`/tree/` or `/-/tree/`) splitting ref and subpath. The first
/// segment after the marker is always taken as the ref: branch names
/// containing `/` are inherently ambiguous and are not disambiguated here.
fn parse_hosted_url(input: &str) -> Option<SourceRef> {
    let (kind, host, marker, path) = if let Some(path) = strip_host(input, "github.com") {
        (SourceKind::GitHub, "github.com", "/tree/", path)
    } else if let Some(path) = strip_host(input, "gitlab.com") {
        (SourceKind::GitLab, "gitlab.com", "/-/tree/", path)
    } else {
        return None;
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let (repo_part, tree_part) = match path.find(marker) {
        Some(idx) => (&path[..idx], Some(&path[idx + marker.len()..])),
        None => (path, None),
    };

    let mut segments = repo_part.splitn(3, '/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;

    let mut source = SourceRef::new(kind);
    source.url = Some(format!("https://{host}/{owner}/{repo}.git"));

    if let Some(tree) = tree_part {
        let tree = tree.trim_matches('/');
        if !tree.is_empty() {
            match tree.split_once('/') {
                Some((git_ref, subpath)) => {
                    source.git_ref = Some(git_ref.to_string());
                    if !subpath.is_empty() {
                        source.subpath = Some(subpath.to_string());
                    }
                },
                None => source.git_ref = Some(tree.to_string()),
            }
        }
    }

    Some(source)
}

/// GitHub shorthand: `owner/repo[/subpath][@skill-filter]`. The filter is
/// split at the last `@` occurring after the owner/repo prefix.
fn parse_github_shorthand(input: &str) -> Option<SourceRef> {
    if input.contains(':') || input.contains(char::is_whitespace) {
        return None;
    }

    let (repo_path, filter) = match input.rfind('@') {
        Some(idx) if idx > 0 && input[..idx].contains('/') => {
            (&input[..idx], Some(&input[idx + 1..]))
        },
        _ => (input, None),
    };

    let repo_path = repo_path.trim_matches('/');
    let mut segments = repo_path.splitn(3, '/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    let subpath = segments.next().filter(|s| !s.is_empty());

    let mut source = SourceRef::new(SourceKind::GitHub);
    source.url = Some(format!("https://github.com/{owner}/{repo}.git"));
    source.subpath = subpath.map(ToOwned::to_owned);
    source.skill_filter = filter.filter(|f| !f.is_empty()).map(ToOwned::to_owned);
    Some(source)
}
