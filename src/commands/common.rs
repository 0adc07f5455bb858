//! Common helper functions for resolving command inputs.

use std::env;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    Context,
    Result,
};

use crate::error::VersionError;

fn invalid(name: &'static str, reason: impl Into<String>) -> anyhow::Error {
    VersionError::InvalidArgument {
        name,
        reason: reason.into(),
    }
    .into()
}

/// Parse `owner/repo` out of a GitHub remote URL.
///
/// Accepts `git@github.com:owner/repo.git`, `ssh://git@github.com/owner/repo`
/// and `https://github.com/owner/repo.git`.
pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
    let rest = ["git@github.com:", "ssh://git@github.com/", "https://github.com/"]
        .iter()
        .find_map(|prefix| url.strip_prefix(prefix))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut parts = rest.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Some((owner.to_string(), repo.to_string()))
        }
        _ => None,
    }
}

/// Detect GitHub repository from environment or git remote.
#[allow(clippy::disallowed_methods)] // CLI tool needs direct env access
pub fn detect_repo(project_dir: &Path) -> Result<(String, String)> {
    // Try GITHUB_REPOSITORY env var first (set by GitHub Actions)
    if let Ok(repo) = env::var("GITHUB_REPOSITORY")
        && let Some((owner, name)) = repo.split_once('/')
        && !owner.is_empty()
        && !name.is_empty()
        && !name.contains('/')
    {
        return Ok((owner.to_string(), name.to_string()));
    }

    let remote_url = gix::discover(project_dir).ok().and_then(|repo| {
        let remote = repo
            .find_default_remote(gix::remote::Direction::Fetch)?
            .ok()?;
        remote
            .url(gix::remote::Direction::Fetch)
            .map(|url| url.to_string())
    });

    remote_url
        .as_deref()
        .and_then(parse_github_remote)
        .ok_or_else(|| {
            invalid(
                "repo",
                "Could not detect GitHub repository. Pass OWNER and REPO or set GITHUB_REPOSITORY",
            )
        })
}

/// Get owner and repo from args or environment.
pub fn get_owner_repo(
    owner: Option<String>,
    repo: Option<String>,
    project_dir: &Path,
) -> Result<(String, String)> {
    match (owner, repo) {
        (Some(o), Some(r)) => Ok((o, r)),
        (Some(_), None) | (None, Some(_)) => {
            Err(invalid("repo", "Both OWNER and REPO must be provided together"))
        }
        (None, None) => detect_repo(project_dir),
    }
}

/// Get the target commit from args, `GITHUB_SHA`, or the local `HEAD`.
#[allow(clippy::disallowed_methods)] // CLI tool needs direct env access
pub fn get_commit(commit: Option<String>, project_dir: &Path) -> Result<String> {
    if let Some(commit) = commit.or_else(|| env::var("GITHUB_SHA").ok())
        && !commit.trim().is_empty()
    {
        return Ok(commit.trim().to_string());
    }

    let repo = gix::discover(project_dir)
        .map_err(|_| invalid("commit", "No COMMIT given and no git repository to read HEAD from"))?;
    let head = repo.head().context("Failed to read HEAD")?;
    let commit_id = head
        .id()
        .ok_or_else(|| invalid("commit", "HEAD does not point to a commit"))?;
    Ok(commit_id.to_string())
}

/// Normalize `--project`: it must exist, and a file stands for its directory.
pub fn project_directory(project: &Path) -> Result<PathBuf> {
    let path = project
        .canonicalize()
        .map_err(|_| invalid("project", format!("{} does not exist", project.display())))?;
    if path.is_dir() {
        return Ok(path);
    }
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| invalid("project", format!("{} has no parent directory", path.display())))
}

/// Root of the git working tree containing `project_dir`, or `project_dir`
/// itself when it is not inside a repository.
pub fn work_tree_root(project_dir: &Path) -> PathBuf {
    gix::discover(project_dir)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
        .unwrap_or_else(|| project_dir.to_path_buf())
}
