//! Version parsing and formatting utilities.
//!
//! Version files use the NerdBank.GitVersioning flavour of semantic versions:
//! two to four numeric components, an optional `-prerelease` suffix and
//! optional `+build` metadata. Only major and minor feed the height
//! computation; the patch position of the computed version is the git height.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{
    Serialize,
    Serializer,
};
use thiserror::Error;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(?P<major>0|[1-9][0-9]*)\.(?P<minor>0|[1-9][0-9]*)(?:\.(?P<patch>0|[1-9][0-9]*))?(?:\.(?P<revision>0|[1-9][0-9]*))?(?P<prerelease>-[0-9a-z-]+(?:\.[0-9a-z-]+)*)?(?P<build>\+[0-9a-z-]+(?:\.[0-9a-z-]+)*)?$",
    )
    .expect("version pattern is a valid regex")
});

/// A version string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{input}\" is not a valid version: {reason}")]
pub struct ParseVersionError {
    input: String,
    reason: &'static str,
}

/// A version as written in a version file, e.g. `1.2`, `1.2.3-beta`,
/// `v2.0-rc.1+build.5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
    pub revision: Option<u32>,
    /// Prerelease suffix including its leading `-`, or empty.
    pub prerelease: String,
    /// Build metadata including its leading `+`, or empty.
    pub build_metadata: String,
}

impl VersionSpec {
    /// The part of the version that decides where git height restarts.
    pub fn major_minor(&self) -> MajorMinor {
        MajorMinor {
            major: self.major,
            minor: self.minor,
        }
    }
}

impl FromStr for VersionSpec {
    type Err = ParseVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = |reason| ParseVersionError {
            input: input.to_string(),
            reason,
        };

        let captures = VERSION_PATTERN
            .captures(input.trim())
            .ok_or_else(|| error("expected major.minor[.patch[.revision]][-prerelease][+build]"))?;

        let number = |name: &str| -> Result<Option<u32>, ParseVersionError> {
            captures
                .name(name)
                .map(|m| m.as_str().parse::<u32>())
                .transpose()
                .map_err(|_| error("numeric component out of range"))
        };
        let text = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            major: number("major")?.unwrap_or_default(),
            minor: number("minor")?.unwrap_or_default(),
            patch: number("patch")?,
            revision: number("revision")?,
            prerelease: text("prerelease"),
            build_metadata: text("build"),
        })
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        write!(f, "{}{}", self.prerelease, self.build_metadata)
    }
}

impl Serialize for VersionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a version string (e.g., "1.2", "v1.2.3-beta").
pub fn parse_version(version_str: &str) -> Result<VersionSpec, ParseVersionError> {
    version_str.parse()
}

/// The `major.minor` pair compared across the history of a version file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MajorMinor {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for MajorMinor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The computed version: major and minor from the version file, the git
/// height in the patch position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSemVer {
    pub major: u32,
    pub minor: u32,
    pub height: u32,
    /// Passed through from the version file, leading `-` included.
    pub prerelease: String,
}

impl ResolvedSemVer {
    /// Combine a version file's version with a git height.
    pub fn new(version: &VersionSpec, height: u32) -> Self {
        Self {
            major: version.major,
            minor: version.minor,
            height,
            prerelease: version.prerelease.clone(),
        }
    }
}

impl fmt::Display for ResolvedSemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            format_version(self.major, self.minor, self.height),
            self.prerelease
        )
    }
}

/// Format version as string.
pub fn format_version(major: u32, minor: u32, height: u32) -> String {
    format!("{}.{}.{}", major, minor, height)
}

/// Assemble the final version string for `version` at the given git height.
pub fn assemble(version: &VersionSpec, height: u32) -> String {
    ResolvedSemVer::new(version, height).to_string()
}
