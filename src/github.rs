//! GitHub API integration for history, content and comparison queries.
//!
//! The version computation only needs three capabilities from a hosted git
//! service; they are expressed by [`GitHost`] so the core can be driven by
//! something other than GitHub (or by a fake in tests). [`GitHubClient`] is
//! the octocrab-backed implementation.

use std::fmt;

use async_trait::async_trait;
use octocrab::{
    Octocrab,
    OctocrabBuilder,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::HostError;

/// A repository on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A commit as returned by a history query. The SHA is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    pub sha: String,
}

impl CommitRef {
    pub fn new(sha: impl Into<String>) -> Self {
        Self { sha: sha.into() }
    }

    /// Abbreviated SHA for display.
    pub fn short_sha(&self) -> &str {
        short_sha(&self.sha)
    }
}

/// First seven characters of a SHA, or the whole string if shorter.
pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// The queries the version computation issues against a git hosting service.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// One page (1-based) of the commits that modified `path`, reachable from
    /// `from_sha`, newest first.
    async fn list_commits(
        &self,
        repo: &RepoId,
        path: &str,
        from_sha: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<CommitRef>, HostError>;

    /// Text content of the file at `path` as of commit `sha`.
    async fn file_content(&self, repo: &RepoId, path: &str, sha: &str) -> Result<String, HostError>;

    /// Number of commits reachable from `head` but not from `base`.
    async fn ahead_by(&self, repo: &RepoId, base: &str, head: &str) -> Result<u64, HostError>;
}

/// How to authenticate against the GitHub API.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Unauthenticated; public repositories only, low rate limit.
    #[default]
    Anonymous,
    /// Personal access token or GitHub Actions token.
    Token(String),
    /// Login plus password or token.
    Basic { login: String, password: String },
}

impl Credentials {
    /// Pick the authentication mode from optional CLI/env values.
    pub fn from_parts(login: Option<String>, token: Option<String>) -> Self {
        match (login, token) {
            (Some(login), Some(password)) => Credentials::Basic { login, password },
            (None, Some(token)) => Credentials::Token(token),
            (_, None) => Credentials::Anonymous,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Basic { login, .. } => write!(f, "Basic({login}, ***)"),
        }
    }
}

/// [`GitHost`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
}

#[derive(Debug, Deserialize)]
struct CommitComparison {
    ahead_by: u64,
}

impl GitHubClient {
    pub fn new(credentials: Credentials) -> Result<Self, HostError> {
        let builder = OctocrabBuilder::new();
        let builder = match credentials {
            Credentials::Anonymous => builder,
            Credentials::Token(token) => builder.personal_token(token),
            Credentials::Basic { login, password } => builder.basic_auth(login, password),
        };
        Ok(Self {
            octocrab: builder.build()?,
        })
    }
}

#[async_trait]
impl GitHost for GitHubClient {
    async fn list_commits(
        &self,
        repo: &RepoId,
        path: &str,
        from_sha: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<CommitRef>, HostError> {
        tracing::debug!(%repo, path, from_sha, page, "listing commits");
        let commits = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .list_commits()
            .sha(from_sha)
            .path(path)
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .map_err(|e| classify(e, || format!("history of {path} at {from_sha} in {repo}")))?;

        Ok(commits
            .items
            .into_iter()
            .map(|commit| CommitRef::new(commit.sha))
            .collect())
    }

    async fn file_content(
        &self,
        repo: &RepoId,
        path: &str,
        sha: &str,
    ) -> Result<String, HostError> {
        tracing::debug!(%repo, path, sha, "fetching file content");
        let contents = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .get_content()
            .path(path)
            .r#ref(sha)
            .send()
            .await
            .map_err(|e| classify(e, || format!("{path} at {sha} in {repo}")))?;

        // A file path yields exactly one item.
        let item = contents
            .items
            .into_iter()
            .next()
            .ok_or_else(|| HostError::NotFound {
                what: format!("{path} at {sha} in {repo}"),
            })?;

        item.decoded_content()
            .ok_or_else(|| HostError::Decode(format!("{path} at {sha} is not a text file")))
    }

    async fn ahead_by(&self, repo: &RepoId, base: &str, head: &str) -> Result<u64, HostError> {
        tracing::debug!(%repo, base, head, "comparing commits");
        let route = format!(
            "/repos/{}/{}/compare/{}...{}",
            repo.owner, repo.name, base, head
        );
        let comparison: CommitComparison = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| classify(e, || format!("comparison {base}...{head} in {repo}")))?;

        Ok(comparison.ahead_by)
    }
}

/// Map "does not exist" style API responses to [`HostError::NotFound`].
fn classify(error: octocrab::Error, what: impl FnOnce() -> String) -> HostError {
    match &error {
        octocrab::Error::GitHub { source, .. }
            if matches!(source.status_code.as_u16(), 404 | 422) =>
        {
            HostError::NotFound { what: what() }
        }
        _ => HostError::Api(error),
    }
}
