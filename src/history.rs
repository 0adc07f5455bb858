//! Lazy, paginated history of a single file.

use std::collections::VecDeque;

use crate::error::{
    Result,
    VersionError,
};
use crate::github::{
    CommitRef,
    GitHost,
    RepoId,
};

/// Commits requested per history page.
pub const PAGE_SIZE: u8 = 100;

/// The commits that modified a path, newest first, reachable from a commit.
///
/// Pages are fetched on demand, so a consumer that stops early never pays for
/// the rest of the history. A fresh walk re-queries the host; nothing is
/// cached between walks.
pub struct CommitHistory<'a, H: ?Sized> {
    host: &'a H,
    repo: RepoId,
    path: String,
    from_commit: String,
    buffer: VecDeque<CommitRef>,
    next_page: u32,
    exhausted: bool,
}

/// Start walking the history of `path` from `from_commit`.
pub fn commits_touching<'a, H: GitHost + ?Sized>(
    host: &'a H,
    repo: &RepoId,
    path: &str,
    from_commit: &str,
) -> Result<CommitHistory<'a, H>> {
    if path.is_empty() {
        return Err(VersionError::InvalidArgument {
            name: "path",
            reason: "path must not be empty".to_string(),
        });
    }
    if from_commit.is_empty() {
        return Err(VersionError::InvalidArgument {
            name: "from_commit",
            reason: "commit SHA must not be empty".to_string(),
        });
    }

    Ok(CommitHistory {
        host,
        repo: repo.clone(),
        path: path.to_string(),
        from_commit: from_commit.to_string(),
        buffer: VecDeque::new(),
        next_page: 1,
        exhausted: false,
    })
}

impl<H: GitHost + ?Sized> CommitHistory<'_, H> {
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next older commit, or `None` once the history is exhausted.
    ///
    /// # Errors
    ///
    /// [`VersionError::HistoryUnavailable`] if the host cannot list the
    /// history (unknown commit or path, transport failure). An empty first
    /// page is a confirmed empty history, not an error.
    pub async fn next_commit(&mut self) -> Result<Option<CommitRef>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .host
                .list_commits(
                    &self.repo,
                    &self.path,
                    &self.from_commit,
                    self.next_page,
                    PAGE_SIZE,
                )
                .await
                .map_err(|source| VersionError::HistoryUnavailable {
                    path: self.path.clone(),
                    commit: self.from_commit.clone(),
                    source,
                })?;

            tracing::debug!(
                path = %self.path,
                page = self.next_page,
                commits = page.len(),
                "fetched history page"
            );
            self.exhausted = page.len() < usize::from(PAGE_SIZE);
            self.next_page += 1;
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}
