//! Find the commit git height is counted from.
//!
//! Height restarts at every `major.minor` change of the version file. Walking
//! the file's history newest first, the anchor is the oldest commit of the
//! run that still carries the working `major.minor`, i.e. the commit right
//! after the last change.
//!
//! When the newest commit already differs, or the history is empty, there is
//! no commit to anchor to and the file counts as new (height 1). A file that
//! was just created and a `major.minor` that was just bumped therefore both
//! restart at height 1; the anchor never points before the start of history.

use serde::Serialize;

use crate::config::VersionFileKind;
use crate::error::{
    Result,
    VersionError,
};
use crate::github::{
    CommitRef,
    GitHost,
    RepoId,
};
use crate::history::CommitHistory;
use crate::version::MajorMinor;

/// Where git height is counted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HeightAnchor {
    /// Height is one more than the ahead-by distance from this commit.
    #[serde(rename_all = "camelCase")]
    Found { commit_sha: String },
    /// The working `major.minor` has no earlier commit to count from.
    NewFile,
}

/// A version file in the repository, by repository path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: String,
    pub kind: VersionFileKind,
}

impl TrackedFile {
    pub fn new(path: impl Into<String>, kind: VersionFileKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Walk `history` until the version file's `major.minor` differs from
/// `working`, fetching each commit's copy of the file on the way.
///
/// `kind` is the format of the file `history` walks. When a past copy of it
/// inherits without declaring a version, `ancestors` (nearest first) are read
/// at the same commit until one declares it.
///
/// Stops at the first divergent commit; later pages and contents are never
/// requested.
///
/// # Errors
///
/// [`VersionError::ConfigFormat`] if the version at some commit cannot be
/// determined, [`VersionError::ContentUnavailable`] if a copy cannot be
/// fetched, plus any history error.
pub async fn find_anchor<H: GitHost + ?Sized>(
    host: &H,
    history: &mut CommitHistory<'_, H>,
    kind: VersionFileKind,
    ancestors: &[TrackedFile],
    working: MajorMinor,
) -> Result<HeightAnchor> {
    let mut previous_commit: Option<String> = None;

    while let Some(commit) = history.next_commit().await? {
        let versioned = TrackedFile::new(history.path(), kind);
        let found = major_minor_at(host, history.repo(), &versioned, ancestors, &commit).await?;

        if found != working {
            tracing::debug!(
                commit = commit.short_sha(),
                %found,
                %working,
                "version changed"
            );
            return Ok(anchor_from(previous_commit));
        }
        tracing::debug!(commit = commit.short_sha(), %working, "same version");
        previous_commit = Some(commit.sha);
    }

    Ok(anchor_from(previous_commit))
}

/// Effective `major.minor` of `file` as of `commit`.
async fn major_minor_at<H: GitHost + ?Sized>(
    host: &H,
    repo: &RepoId,
    file: &TrackedFile,
    ancestors: &[TrackedFile],
    commit: &CommitRef,
) -> Result<MajorMinor> {
    for candidate in std::iter::once(file).chain(ancestors) {
        let content = host
            .file_content(repo, &candidate.path, &commit.sha)
            .await
            .map_err(|source| VersionError::ContentUnavailable {
                path: candidate.path.clone(),
                commit: commit.sha.clone(),
                source,
            })?;

        let location = format!("{}@{}", candidate.path, commit.short_sha());
        match candidate.kind.major_minor_at(&content, &location)? {
            Some(found) => return Ok(found),
            None => tracing::debug!(%location, "version inherited from parent directory"),
        }
    }

    Err(VersionError::ConfigFormat {
        location: format!("{}@{}", file.path, commit.short_sha()),
        message: "inherits its version but no parent version file declares one".to_string(),
    })
}

fn anchor_from(previous_commit: Option<String>) -> HeightAnchor {
    match previous_commit {
        Some(commit_sha) => HeightAnchor::Found { commit_sha },
        None => HeightAnchor::NewFile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::commits_touching;
    use crate::testing::FakeHost;

    const PATH: &str = "version.json";
    const V12: &str = r#"{"version":"1.2"}"#;
    const V13: &str = r#"{"version":"1.3"}"#;

    fn working() -> MajorMinor {
        MajorMinor { major: 1, minor: 3 }
    }

    async fn anchor_for(host: &FakeHost, from: &str) -> Result<HeightAnchor> {
        let repo = RepoId::new("owner", "repo");
        let mut history = commits_touching(host, &repo, PATH, from)?;
        find_anchor(host, &mut history, VersionFileKind::Structured, &[], working()).await
    }

    #[tokio::test]
    async fn test_anchor_is_commit_before_divergence() {
        let host = FakeHost::new(PATH)
            .with_history(&["c3", "c2", "c1"])
            .with_content("c3", V13)
            .with_content("c2", V13)
            .with_content("c1", V12);

        let anchor = anchor_for(&host, "c3").await.unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c2".to_string()
            }
        );
        assert_eq!(host.content_calls(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_divergence() {
        let host = FakeHost::new(PATH)
            .with_history(&["c4", "c3", "c2", "c1"])
            .with_content("c4", V13)
            .with_content("c3", V12);

        let anchor = anchor_for(&host, "c4").await.unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c4".to_string()
            }
        );
        // c2 and c1 have no scripted content; touching them would fail.
        assert_eq!(host.content_calls(), 2);
    }

    #[tokio::test]
    async fn test_single_matching_commit_is_found() {
        let host = FakeHost::new(PATH)
            .with_history(&["c1"])
            .with_content("c1", V13);

        let anchor = anchor_for(&host, "c1").await.unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_all_matching_anchors_at_oldest() {
        let host = FakeHost::new(PATH)
            .with_history(&["c3", "c2", "c1"])
            .with_content("c3", V13)
            .with_content("c2", r#"{"version":"1.3.7-rc"}"#)
            .with_content("c1", V13);

        let anchor = anchor_for(&host, "c3").await.unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_history_is_new_file() {
        let host = FakeHost::new(PATH);

        assert_eq!(anchor_for(&host, "c1").await.unwrap(), HeightAnchor::NewFile);
        assert_eq!(host.content_calls(), 0);
    }

    #[tokio::test]
    async fn test_newest_commit_differs_is_new_file() {
        let host = FakeHost::new(PATH)
            .with_history(&["c2", "c1"])
            .with_content("c2", V12);

        assert_eq!(anchor_for(&host, "c2").await.unwrap(), HeightAnchor::NewFile);
        assert_eq!(host.content_calls(), 1);
    }

    #[tokio::test]
    async fn test_inherited_history_reads_parent_at_same_commit() {
        let host = FakeHost::new("src/version.json")
            .with_history(&["c3", "c2", "c1"])
            .with_content("c3", r#"{"inherit":true,"version":"1.3"}"#)
            .with_content("c2", r#"{"inherit":true}"#)
            .with_file_at("version.json", "c2", V13)
            .with_content("c1", r#"{"inherit":true}"#)
            .with_file_at("version.json", "c1", V12);
        let repo = RepoId::new("owner", "repo");
        let ancestors = [TrackedFile::new("version.json", VersionFileKind::Structured)];
        let mut history = commits_touching(&host, &repo, "src/version.json", "c3").unwrap();

        let anchor = find_anchor(
            &host,
            &mut history,
            VersionFileKind::Structured,
            &ancestors,
            working(),
        )
        .await
        .unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_inherited_history_without_parent_is_format_error() {
        let host = FakeHost::new(PATH)
            .with_history(&["c2", "c1"])
            .with_content("c2", V13)
            .with_content("c1", r#"{"inherit":true}"#);

        let err = anchor_for(&host, "c2").await.unwrap_err();
        assert!(matches!(err, VersionError::ConfigFormat { .. }));
        assert!(err.to_string().contains("version.json@c1"));
    }

    #[tokio::test]
    async fn test_missing_content_is_content_unavailable() {
        let host = FakeHost::new(PATH).with_history(&["c1"]);

        let err = anchor_for(&host, "c1").await.unwrap_err();
        assert!(matches!(err, VersionError::ContentUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_historical_content_is_format_error() {
        let host = FakeHost::new(PATH)
            .with_history(&["0123456789abcdef"])
            .with_content("0123456789abcdef", "{{{");

        let err = anchor_for(&host, "0123456789abcdef").await.unwrap_err();
        assert!(matches!(err, VersionError::ConfigFormat { .. }));
        assert!(err.to_string().contains("version.json@0123456"));
    }

    #[tokio::test]
    async fn test_legacy_history() {
        let host = FakeHost::new("version.txt")
            .with_history(&["c2", "c1"])
            .with_content("c2", "1.3\n")
            .with_content("c1", "1.2\nbeta\n");
        let repo = RepoId::new("owner", "repo");
        let mut history = commits_touching(&host, &repo, "version.txt", "c2").unwrap();

        let anchor = find_anchor(&host, &mut history, VersionFileKind::Legacy, &[], working())
            .await
            .unwrap();
        assert_eq!(
            anchor,
            HeightAnchor::Found {
                commit_sha: "c2".to_string()
            }
        );
    }

    #[test]
    fn test_anchor_serializes_with_kind_tag() {
        let json = serde_json::to_value(HeightAnchor::Found {
            commit_sha: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "found");
        assert_eq!(json["commitSha"], "abc");
        assert_eq!(
            serde_json::to_value(HeightAnchor::NewFile).unwrap()["kind"],
            "newFile"
        );
    }
}
