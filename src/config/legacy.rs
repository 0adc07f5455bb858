//! The legacy `version.txt` format.

use super::strip_bom;
use crate::error::{
    Result,
    VersionError,
};
use crate::version::VersionSpec;

/// Parse a `version.txt` file.
///
/// The first line holds the version, the optional second line a prerelease
/// tag. SemVer requires prerelease suffixes to start with a hyphen, so one is
/// added when missing. Any other content is a format error.
pub fn parse_legacy(content: &str, location: &str) -> Result<VersionSpec> {
    let mut lines = strip_bom(content).lines();
    let version_line = lines.next().unwrap_or_default().trim();
    let prerelease = lines.next().unwrap_or_default().trim();

    let text = match prerelease {
        "" => version_line.to_string(),
        tag if tag.starts_with('-') => format!("{version_line}{tag}"),
        tag => format!("{version_line}-{tag}"),
    };

    text.parse().map_err(|e| VersionError::ConfigFormat {
        location: location.to_string(),
        message: format!("{e}"),
    })
}
