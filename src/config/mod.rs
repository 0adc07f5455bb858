//! Version file model.
//!
//! Two on-disk formats define a project's version:
//!
//! - `version.txt`: the legacy two-line format (`major.minor[.patch]` on the
//!   first line, an optional prerelease tag on the second).
//! - `version.json`: the structured format, which may `inherit` from the
//!   nearest `version.json`/`version.txt` in an ancestor directory.
//!
//! [`resolver::resolve`] finds and merges them; [`render`] turns the effective
//! configuration back into JSON.

mod legacy;
pub mod render;
pub mod resolver;

use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

pub use self::legacy::parse_legacy;
pub use self::render::{
    RenderOptions,
    render,
};
pub use self::resolver::{
    ResolvedVersion,
    resolve,
};
use crate::error::{
    Result,
    VersionError,
};
use crate::version::{
    MajorMinor,
    VersionSpec,
};

/// The filename of the legacy version file.
pub const TXT_FILE_NAME: &str = "version.txt";

/// The filename of the structured version file.
pub const JSON_FILE_NAME: &str = "version.json";

/// Drop a leading UTF-8 byte order mark, as written by Visual Studio and other
/// .NET tooling.
pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Which of the two version file formats a configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionFileKind {
    Legacy,
    Structured,
}

impl VersionFileKind {
    /// Lookup order within a single directory.
    pub const SEARCH_ORDER: [VersionFileKind; 2] =
        [VersionFileKind::Legacy, VersionFileKind::Structured];

    pub fn file_name(self) -> &'static str {
        match self {
            VersionFileKind::Legacy => TXT_FILE_NAME,
            VersionFileKind::Structured => JSON_FILE_NAME,
        }
    }

    /// Extract the `major.minor` recorded in a historical copy of the file.
    ///
    /// Returns `None` only for a `version.json` that inherits and does not
    /// declare a version itself; the caller must look it up in the ancestor.
    /// Unlike the working-tree lookup, unparsable content and a
    /// non-inheriting `version.json` without a version are errors here: a
    /// commit whose version cannot be read cannot be placed before or after a
    /// version change.
    pub fn major_minor_at(self, content: &str, location: &str) -> Result<Option<MajorMinor>> {
        let format_error = |message: &str| VersionError::ConfigFormat {
            location: location.to_string(),
            message: message.to_string(),
        };

        match self {
            VersionFileKind::Legacy => {
                parse_legacy(content, location).map(|version| Some(version.major_minor()))
            }
            VersionFileKind::Structured => match parse_structured(content, location)? {
                Some(VersionConfig {
                    version: Some(version),
                    ..
                }) => Ok(Some(version.major_minor())),
                Some(config) if config.inherit => Ok(None),
                Some(_) => Err(format_error("version.json declares no version")),
                None => Err(format_error("content is not a valid version.json document")),
            },
        }
    }
}

/// A version file on disk and its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
    pub path: PathBuf,
    pub kind: VersionFileKind,
}

impl VersionFile {
    pub fn new(directory: &Path, kind: VersionFileKind) -> Self {
        Self {
            path: directory.join(kind.file_name()),
            kind,
        }
    }
}

/// Precision of the assembly version derived from the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionPrecision {
    Major,
    #[default]
    Minor,
    Build,
    Revision,
}

/// The `assemblyVersion` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyVersion {
    pub version: VersionSpec,
    pub precision: Option<VersionPrecision>,
}

impl AssemblyVersion {
    pub fn precision_or_default(&self) -> VersionPrecision {
        self.precision.unwrap_or_default()
    }
}

/// A parsed version file.
///
/// Every field except `inherit` is optional so that an inheriting file can
/// express exactly which settings it overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConfig {
    pub version: Option<VersionSpec>,
    pub assembly_version: Option<AssemblyVersion>,
    pub build_number_offset: Option<i32>,
    pub sem_ver1_numeric_identifier_padding: Option<u32>,
    pub git_commit_id_short_fixed_length: Option<u32>,
    pub git_commit_id_short_auto_minimum: Option<u32>,
    pub public_release_ref_spec: Option<Vec<String>>,
    pub inherit: bool,
}

impl VersionConfig {
    /// Overlay the settings this file sets explicitly onto `ancestor`.
    pub fn merged_onto(self, ancestor: VersionConfig) -> VersionConfig {
        VersionConfig {
            version: self.version.or(ancestor.version),
            assembly_version: self.assembly_version.or(ancestor.assembly_version),
            build_number_offset: self.build_number_offset.or(ancestor.build_number_offset),
            sem_ver1_numeric_identifier_padding: self
                .sem_ver1_numeric_identifier_padding
                .or(ancestor.sem_ver1_numeric_identifier_padding),
            git_commit_id_short_fixed_length: self
                .git_commit_id_short_fixed_length
                .or(ancestor.git_commit_id_short_fixed_length),
            git_commit_id_short_auto_minimum: self
                .git_commit_id_short_auto_minimum
                .or(ancestor.git_commit_id_short_auto_minimum),
            public_release_ref_spec: self
                .public_release_ref_spec
                .or(ancestor.public_release_ref_spec),
            inherit: self.inherit,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersionConfig {
    version: Option<String>,
    assembly_version: Option<RawAssemblyVersion>,
    build_number_offset: Option<i32>,
    #[serde(rename = "semVer1NumericIdentifierPadding")]
    sem_ver1_numeric_identifier_padding: Option<u32>,
    git_commit_id_short_fixed_length: Option<u32>,
    git_commit_id_short_auto_minimum: Option<u32>,
    public_release_ref_spec: Option<Vec<String>>,
    #[serde(default)]
    inherit: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAssemblyVersion {
    Version(String),
    Options {
        version: String,
        precision: Option<VersionPrecision>,
    },
}

/// Parse the content of a `version.json` file.
///
/// Returns `Ok(None)` when the document is not valid JSON or does not have the
/// expected shape, so that a half-written file is skipped rather than fatal.
/// A well-formed document whose version strings are invalid is an error.
pub fn parse_structured(content: &str, location: &str) -> Result<Option<VersionConfig>> {
    let raw: RawVersionConfig = match serde_json::from_str(strip_bom(content)) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(%location, error = %e, "ignoring malformed version.json");
            return Ok(None);
        }
    };

    let version_at = |text: &str| -> Result<VersionSpec> {
        text.parse().map_err(|e| VersionError::ConfigFormat {
            location: location.to_string(),
            message: format!("{e}"),
        })
    };

    let assembly_version = match raw.assembly_version {
        Some(RawAssemblyVersion::Version(version)) => Some(AssemblyVersion {
            version: version_at(&version)?,
            precision: None,
        }),
        Some(RawAssemblyVersion::Options { version, precision }) => Some(AssemblyVersion {
            version: version_at(&version)?,
            precision,
        }),
        None => None,
    };

    Ok(Some(VersionConfig {
        version: raw.version.as_deref().map(version_at).transpose()?,
        assembly_version,
        build_number_offset: raw.build_number_offset,
        sem_ver1_numeric_identifier_padding: raw.sem_ver1_numeric_identifier_padding,
        git_commit_id_short_fixed_length: raw.git_commit_id_short_fixed_length,
        git_commit_id_short_auto_minimum: raw.git_commit_id_short_auto_minimum,
        public_release_ref_spec: raw.public_release_ref_spec,
        inherit: raw.inherit,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_full_document() {
        let config = parse_structured(
            r#"{
                "version": "1.3-beta",
                "assemblyVersion": { "version": "1.0", "precision": "build" },
                "buildNumberOffset": 7,
                "publicReleaseRefSpec": ["^refs/heads/main$"],
                "unknownSetting": true
            }"#,
            "version.json",
        )
        .unwrap()
        .unwrap();

        let version = config.version.unwrap();
        assert_eq!(version.major_minor(), MajorMinor { major: 1, minor: 3 });
        assert_eq!(version.prerelease, "-beta");
        let assembly = config.assembly_version.unwrap();
        assert_eq!(assembly.precision_or_default(), VersionPrecision::Build);
        assert_eq!(config.build_number_offset, Some(7));
        assert_eq!(
            config.public_release_ref_spec,
            Some(vec!["^refs/heads/main$".to_string()])
        );
        assert!(!config.inherit);
    }

    #[test]
    fn test_parse_structured_assembly_version_string() {
        let config = parse_structured(r#"{"version":"2.0","assemblyVersion":"2.0"}"#, "v.json")
            .unwrap()
            .unwrap();
        let assembly = config.assembly_version.unwrap();
        assert_eq!(assembly.precision, None);
        assert_eq!(assembly.precision_or_default(), VersionPrecision::Minor);
    }

    #[test]
    fn test_parse_structured_malformed_is_absent() {
        assert_eq!(parse_structured("{ not json", "version.json").unwrap(), None);
        assert_eq!(parse_structured(r#"{"version": 12}"#, "version.json").unwrap(), None);
        assert_eq!(parse_structured("[]", "version.json").unwrap(), None);
    }

    #[test]
    fn test_parse_structured_invalid_version_is_fatal() {
        let err = parse_structured(r#"{"version":"banana"}"#, "/repo/version.json").unwrap_err();
        assert!(matches!(err, VersionError::ConfigFormat { .. }));
        assert!(err.to_string().contains("/repo/version.json"));
    }

    #[test]
    fn test_merged_onto_child_overrides_only_set_fields() {
        let ancestor = parse_structured(
            r#"{"version":"1.2","buildNumberOffset":3,"gitCommitIdShortFixedLength":12}"#,
            "a",
        )
        .unwrap()
        .unwrap();
        let child = parse_structured(r#"{"inherit":true,"version":"1.5"}"#, "b")
            .unwrap()
            .unwrap();

        let merged = child.merged_onto(ancestor);
        assert_eq!(merged.version.unwrap().to_string(), "1.5");
        assert_eq!(merged.build_number_offset, Some(3));
        assert_eq!(merged.git_commit_id_short_fixed_length, Some(12));
        assert!(merged.inherit);
    }

    #[test]
    fn test_major_minor_at_inheriting_json_is_unknown() {
        let found = VersionFileKind::Structured
            .major_minor_at(r#"{"inherit":true}"#, "version.json@abc")
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_parse_structured_skips_byte_order_mark() {
        let config = parse_structured("\u{feff}{\"version\":\"1.2\"}", "version.json")
            .unwrap()
            .unwrap();
        assert_eq!(config.version.unwrap().to_string(), "1.2");
    }

    #[test]
    fn test_major_minor_at_json_without_version_or_inherit_is_error() {
        let err = VersionFileKind::Structured
            .major_minor_at(r#"{"buildNumberOffset":1}"#, "version.json@abc")
            .unwrap_err();
        assert!(matches!(err, VersionError::ConfigFormat { .. }));
    }

    #[test]
    fn test_major_minor_at_rejects_garbage_history() {
        let err = VersionFileKind::Structured
            .major_minor_at("<<<<<<< HEAD", "version.json@abc")
            .unwrap_err();
        assert!(err.to_string().contains("version.json@abc"));
    }

    #[test]
    fn test_major_minor_at_legacy() {
        let found = VersionFileKind::Legacy
            .major_minor_at("3.1.4\nrc\n", "version.txt@abc")
            .unwrap();
        assert_eq!(found, Some(MajorMinor { major: 3, minor: 1 }));
    }
}
