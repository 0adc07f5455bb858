//! Git height from an anchor commit.

use crate::anchor::HeightAnchor;
use crate::error::{
    HostError,
    Result,
    VersionError,
};
use crate::github::{
    GitHost,
    RepoId,
};

/// Git height of `target_commit` relative to `anchor`.
///
/// The anchor commit itself has height 1, so the height is the ahead-by
/// distance plus one. A new file is always at height 1 and needs no query.
///
/// # Errors
///
/// [`VersionError::IncomparableCommits`] if the host cannot relate the two
/// commits.
pub async fn git_height<H: GitHost + ?Sized>(
    host: &H,
    repo: &RepoId,
    anchor: &HeightAnchor,
    target_commit: &str,
) -> Result<u32> {
    let base = match anchor {
        HeightAnchor::NewFile => return Ok(1),
        HeightAnchor::Found { commit_sha } => commit_sha,
    };

    let incomparable = |source| VersionError::IncomparableCommits {
        base: base.clone(),
        head: target_commit.to_string(),
        source,
    };

    let distance = host
        .ahead_by(repo, base, target_commit)
        .await
        .map_err(incomparable)?;

    let height = u32::try_from(distance)
        .ok()
        .and_then(|d| d.checked_add(1))
        .ok_or_else(|| {
            incomparable(HostError::Decode(format!("ahead-by {distance} out of range")))
        })?;

    tracing::debug!(base = %base, head = target_commit, distance, height, "computed git height");
    Ok(height)
}
