//! End-to-end version computation.
//!
//! Resolve the working version file, walk its history on the host to find the
//! height anchor, measure the height of the target commit, and assemble the
//! version. Every failure aborts the whole chain; no partial version is ever
//! returned.

use std::path::{
    Component,
    Path,
    PathBuf,
};

use crate::anchor::{
    HeightAnchor,
    TrackedFile,
    find_anchor,
};
use crate::config::{
    VersionConfig,
    VersionFile,
    resolve,
};
use crate::error::{
    Result,
    VersionError,
};
use crate::github::{
    GitHost,
    RepoId,
    short_sha,
};
use crate::height::git_height;
use crate::history::commits_touching;
use crate::version::ResolvedSemVer;

/// What to compute a version for.
#[derive(Debug, Clone)]
pub struct VersionRequest {
    pub repo: RepoId,
    /// Target commit SHA.
    pub commit: String,
    /// Directory whose version file governs the version.
    pub project_dir: PathBuf,
    /// Root of the working tree; repository paths are relative to it.
    pub repo_root: PathBuf,
}

/// A computed version and how it was derived.
#[derive(Debug, Clone)]
pub struct VersionOutcome {
    pub version: ResolvedSemVer,
    pub anchor: HeightAnchor,
    pub config_directory: PathBuf,
    /// Repository path of the version file, `/`-separated.
    pub config_path: String,
    /// Repository path of the file that sets the version; its history
    /// decides the height. Differs from `config_path` when the version is
    /// inherited.
    pub version_path: String,
    /// The effective (merged) configuration.
    pub config: VersionConfig,
}

/// Computes versions against a [`GitHost`].
pub struct VersionOracle<'a, H: ?Sized> {
    host: &'a H,
}

impl<'a, H: GitHost + ?Sized> VersionOracle<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Compute the version of `request.commit`.
    ///
    /// # Errors
    ///
    /// Any [`VersionError`]; [`VersionError::ConfigNotFound`] when no version
    /// file governs the project directory.
    pub async fn compute(&self, request: &VersionRequest) -> Result<VersionOutcome> {
        validate(request)?;

        let resolved = resolve(&request.project_dir)?.ok_or_else(|| VersionError::ConfigNotFound {
            directory: request.project_dir.clone(),
        })?;
        let config_path = repository_path(&request.repo_root, &resolved.config_path())?;
        let versioned = tracked(&request.repo_root, resolved.version_file())?;
        let ancestors = resolved
            .version_ancestors()
            .iter()
            .map(|file| tracked(&request.repo_root, file))
            .collect::<Result<Vec<_>>>()?;
        let working = resolved.version().major_minor();

        tracing::info!(
            repo = %request.repo,
            commit = short_sha(&request.commit),
            file = %versioned.path,
            %working,
            "resolving version"
        );

        let mut history =
            commits_touching(self.host, &request.repo, &versioned.path, &request.commit)?;
        let anchor =
            find_anchor(self.host, &mut history, versioned.kind, &ancestors, working).await?;
        let height = git_height(self.host, &request.repo, &anchor, &request.commit).await?;

        tracing::info!(?anchor, height, "computed git height");

        Ok(VersionOutcome {
            version: ResolvedSemVer::new(resolved.version(), height),
            anchor,
            config_directory: resolved.found_directory().to_path_buf(),
            config_path,
            version_path: versioned.path,
            config: resolved.config().clone(),
        })
    }
}

fn tracked(repo_root: &Path, file: &VersionFile) -> Result<TrackedFile> {
    Ok(TrackedFile::new(
        repository_path(repo_root, &file.path)?,
        file.kind,
    ))
}

fn validate(request: &VersionRequest) -> Result<()> {
    let required = [
        ("owner", request.repo.owner.as_str()),
        ("repo", request.repo.name.as_str()),
        ("commit", request.commit.as_str()),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(VersionError::InvalidArgument {
                name,
                reason: "must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Path of `file` relative to `repo_root`, `/`-separated as the GitHub API
/// expects.
pub fn repository_path(repo_root: &Path, file: &Path) -> Result<String> {
    let root = std::fs::canonicalize(repo_root).map_err(|source| VersionError::Io {
        path: repo_root.to_path_buf(),
        source,
    })?;

    let relative = file
        .strip_prefix(&root)
        .map_err(|_| VersionError::InvalidArgument {
            name: "repo_root",
            reason: format!("{} is not inside {}", file.display(), root.display()),
        })?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}
