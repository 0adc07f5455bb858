//! Error types for version resolution.
//!
//! Every variant of [`VersionError`] is an *expected* failure: it names the
//! file, commit or path involved and is reported to the user without a
//! backtrace. Anything else reaching `main` is treated as an internal error.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`GitHost`](crate::github::GitHost) implementation.
#[derive(Debug, Error)]
pub enum HostError {
    /// The service reported that the object does not exist (or cannot be
    /// related to the request, e.g. HTTP 404/422).
    #[error("{what} not found")]
    NotFound {
        /// Human readable description of the missing object.
        what: String,
    },

    /// Transport or API failure from the GitHub client.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// The service answered, but the payload could not be interpreted.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Errors that abort a version resolution.
#[derive(Debug, Error)]
pub enum VersionError {
    /// A required input was empty or otherwise unusable.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// No `version.txt` or `version.json` exists in the directory or any of
    /// its ancestors.
    #[error("No version.txt or version.json found in {} or any parent directory", directory.display())]
    ConfigNotFound {
        /// Directory the search started from.
        directory: PathBuf,
    },

    /// A version file exists but does not contain a recognizable version.
    #[error("Unrecognized version format in {location}: {message}")]
    ConfigFormat {
        /// File path, optionally qualified with a commit.
        location: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A `version.json` sets `inherit: true` but no ancestor defines a
    /// version.
    #[error(
        "\"{}\" inherits from a parent directory version.json file but none exists",
        path.display()
    )]
    MissingInheritanceTarget {
        /// The inheriting file.
        path: PathBuf,
    },

    /// A version file could not be read from disk.
    #[error("Failed to read {}", path.display())]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The commit history of the version file could not be listed.
    #[error("History of {path} at commit {commit} is unavailable")]
    HistoryUnavailable {
        /// Repository path of the version file.
        path: String,
        /// Commit the history was requested from.
        commit: String,
        /// Host failure.
        #[source]
        source: HostError,
    },

    /// The content of the version file at a given commit could not be read.
    #[error("Content of {path} at commit {commit} is unavailable")]
    ContentUnavailable {
        /// Repository path of the version file.
        path: String,
        /// Commit the content was requested at.
        commit: String,
        /// Host failure.
        #[source]
        source: HostError,
    },

    /// The host could not compute the ahead-by distance between two commits.
    #[error("Cannot compare commit {base} with {head}")]
    IncomparableCommits {
        /// Anchor commit.
        base: String,
        /// Target commit.
        head: String,
        /// Host failure.
        #[source]
        source: HostError,
    },

    /// The computation was interrupted before a version was produced.
    #[error("Version computation cancelled")]
    Cancelled,
}

/// Result alias used throughout the library.
pub type Result<T, E = VersionError> = std::result::Result<T, E>;
