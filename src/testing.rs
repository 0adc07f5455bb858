//! In-memory [`GitHost`] for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use async_trait::async_trait;

use crate::error::HostError;
use crate::github::{
    CommitRef,
    GitHost,
    RepoId,
};

/// Scripted history of a single tracked file, plus the content of any file at
/// any commit.
#[derive(Debug, Default)]
pub struct FakeHost {
    path: String,
    history: Vec<String>,
    contents: HashMap<(String, String), String>,
    distances: HashMap<(String, String), u64>,
    history_failure: Option<String>,
    list_calls: AtomicUsize,
    content_calls: AtomicUsize,
    compare_calls: AtomicUsize,
}

impl FakeHost {
    /// A host whose only tracked file is `path`, with no history yet.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Commits touching the tracked file, newest first.
    pub fn with_history(mut self, shas: &[&str]) -> Self {
        self.history = shas.iter().map(|sha| sha.to_string()).collect();
        self
    }

    /// Content of the tracked file at `sha`.
    pub fn with_content(self, sha: &str, content: &str) -> Self {
        let path = self.path.clone();
        self.with_file_at(&path, sha, content)
    }

    /// Content of any file at `sha`.
    pub fn with_file_at(mut self, path: &str, sha: &str, content: &str) -> Self {
        self.contents
            .insert((path.to_string(), sha.to_string()), content.to_string());
        self
    }

    pub fn with_ahead_by(mut self, base: &str, head: &str, distance: u64) -> Self {
        self.distances
            .insert((base.to_string(), head.to_string()), distance);
        self
    }

    /// Make every history query fail with [`HostError::NotFound`].
    pub fn failing_history(mut self, what: &str) -> Self {
        self.history_failure = Some(what.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn compare_calls(&self) -> usize {
        self.compare_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitHost for FakeHost {
    async fn list_commits(
        &self,
        _repo: &RepoId,
        path: &str,
        from_sha: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<CommitRef>, HostError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(what) = &self.history_failure {
            return Err(HostError::NotFound { what: what.clone() });
        }
        if path != self.path {
            return Ok(Vec::new());
        }

        let start = self
            .history
            .iter()
            .position(|sha| sha == from_sha)
            .unwrap_or(0);
        let per_page = usize::from(per_page);
        let skip = start + (page as usize - 1) * per_page;

        Ok(self
            .history
            .iter()
            .skip(skip)
            .take(per_page)
            .map(|sha| CommitRef::new(sha.clone()))
            .collect())
    }

    async fn file_content(
        &self,
        _repo: &RepoId,
        path: &str,
        sha: &str,
    ) -> Result<String, HostError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.contents
            .get(&(path.to_string(), sha.to_string()))
            .cloned()
            .ok_or_else(|| HostError::NotFound {
                what: format!("{path} at {sha}"),
            })
    }

    async fn ahead_by(&self, _repo: &RepoId, base: &str, head: &str) -> Result<u64, HostError> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        self.distances
            .get(&(base.to_string(), head.to_string()))
            .copied()
            .ok_or_else(|| HostError::NotFound {
                what: format!("comparison {base}...{head}"),
            })
    }
}
