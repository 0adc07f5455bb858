//! Locate the version file that governs a directory.
//!
//! The search starts at the project directory and walks up to the filesystem
//! root. At each level `version.txt` is checked before `version.json`; the
//! first file that defines a version ends the walk. A `version.json` with
//! `"inherit": true` does not end it: it is remembered and later overlaid on
//! whatever the walk finds further up.

use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use super::{
    VersionConfig,
    VersionFile,
    VersionFileKind,
    parse_legacy,
    parse_structured,
};
use crate::error::{
    Result,
    VersionError,
};
use crate::version::VersionSpec;

/// The effective version configuration for a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    config: VersionConfig,
    version: VersionSpec,
    found_directory: PathBuf,
    file_kind: VersionFileKind,
    version_file: VersionFile,
    version_ancestors: Vec<VersionFile>,
}

impl ResolvedVersion {
    /// The merged configuration.
    pub fn config(&self) -> &VersionConfig {
        &self.config
    }

    pub fn version(&self) -> &VersionSpec {
        &self.version
    }

    /// Directory holding the version file nearest to the query directory.
    ///
    /// For an inheriting `version.json` this is the inheriting file's
    /// directory, not the ancestor it inherited from.
    pub fn found_directory(&self) -> &Path {
        &self.found_directory
    }

    pub fn file_kind(&self) -> VersionFileKind {
        self.file_kind
    }

    /// Absolute path of the version file in [`Self::found_directory`].
    pub fn config_path(&self) -> PathBuf {
        self.found_directory.join(self.file_kind.file_name())
    }

    /// The nearest file that sets `version` itself.
    ///
    /// Differs from [`Self::config_path`] when the nearest file inherits its
    /// version. Changes to this file are what move the version.
    pub fn version_file(&self) -> &VersionFile {
        &self.version_file
    }

    /// Files above [`Self::version_file`] up to and including the one that
    /// ended the walk, nearest first. A past copy of the version file that
    /// inherits without a version takes its version from these.
    pub fn version_ancestors(&self) -> &[VersionFile] {
        &self.version_ancestors
    }
}

/// What one directory contributes to the resolution.
enum Level {
    /// A file that defines the version on its own.
    Defined {
        kind: VersionFileKind,
        config: VersionConfig,
        version: VersionSpec,
    },
    /// A `version.json` that inherits from an ancestor.
    Inheriting { config: VersionConfig },
}

/// Resolve the version configuration governing `start_directory`.
///
/// Returns `Ok(None)` when neither file exists anywhere up to the root. Every
/// call reads the filesystem afresh.
///
/// # Errors
///
/// - [`VersionError::InvalidArgument`] for an empty path
/// - [`VersionError::Io`] if the directory or a version file cannot be read
/// - [`VersionError::ConfigFormat`] for an unparsable `version.txt` or an
///   invalid version string in `version.json`
/// - [`VersionError::MissingInheritanceTarget`] if an inheriting
///   `version.json` has nothing to inherit from
pub fn resolve(start_directory: &Path) -> Result<Option<ResolvedVersion>> {
    if start_directory.as_os_str().is_empty() {
        return Err(VersionError::InvalidArgument {
            name: "start_directory",
            reason: "path must not be empty".to_string(),
        });
    }

    let start = fs::canonicalize(start_directory).map_err(|source| VersionError::Io {
        path: start_directory.to_path_buf(),
        source,
    })?;

    // Inheriting files seen so far, nearest to `start` first.
    let mut pending: Vec<(PathBuf, VersionConfig)> = Vec::new();
    let mut search_directory = Some(start.as_path());

    while let Some(directory) = search_directory {
        match read_level(directory)? {
            Some(Level::Defined {
                kind,
                config,
                version,
            }) => {
                tracing::debug!(
                    directory = %directory.display(),
                    file = kind.file_name(),
                    inherited_by = pending.len(),
                    "found version file"
                );
                return Ok(Some(fold_layers(directory, kind, config, version, pending)));
            }
            Some(Level::Inheriting { config }) => {
                tracing::debug!(
                    directory = %directory.display(),
                    "version.json inherits from parent"
                );
                pending.push((directory.to_path_buf(), config));
            }
            None => {}
        }
        search_directory = directory.parent();
    }

    match pending.pop() {
        Some((directory, _)) => Err(VersionError::MissingInheritanceTarget {
            path: directory.join(VersionFileKind::Structured.file_name()),
        }),
        None => Ok(None),
    }
}

/// Overlay the pending inheriting layers, outermost first, onto the defining
/// file found at `directory`.
fn fold_layers(
    directory: &Path,
    kind: VersionFileKind,
    config: VersionConfig,
    version: VersionSpec,
    pending: Vec<(PathBuf, VersionConfig)>,
) -> ResolvedVersion {
    let defining = VersionFile::new(directory, kind);
    let Some((nearest, _)) = pending.first() else {
        return ResolvedVersion {
            config,
            version,
            found_directory: directory.to_path_buf(),
            file_kind: kind,
            version_file: defining,
            version_ancestors: Vec::new(),
        };
    };
    let found_directory = nearest.clone();

    let mut chain: Vec<VersionFile> = pending
        .iter()
        .skip_while(|(_, layer)| layer.version.is_none())
        .map(|(layer_directory, _)| VersionFile::new(layer_directory, VersionFileKind::Structured))
        .collect();
    chain.push(defining);
    let version_file = chain.remove(0);

    let (config, version) = pending
        .into_iter()
        .rev()
        .fold((config, version), |(ancestor, version), (_, layer)| {
            let version = layer.version.clone().unwrap_or(version);
            (layer.merged_onto(ancestor), version)
        });

    ResolvedVersion {
        config,
        version,
        found_directory,
        file_kind: VersionFileKind::Structured,
        version_file,
        version_ancestors: chain,
    }
}

fn read_level(directory: &Path) -> Result<Option<Level>> {
    for kind in VersionFileKind::SEARCH_ORDER {
        let path = directory.join(kind.file_name());
        if !path.is_file() {
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|source| VersionError::Io {
            path: path.clone(),
            source,
        })?;
        let location = path.display().to_string();

        match kind {
            VersionFileKind::Legacy => {
                let version = parse_legacy(&content, &location)?;
                let config = VersionConfig {
                    version: Some(version.clone()),
                    ..VersionConfig::default()
                };
                return Ok(Some(Level::Defined {
                    kind,
                    config,
                    version,
                }));
            }
            VersionFileKind::Structured => match parse_structured(&content, &location)? {
                Some(config) if config.inherit => return Ok(Some(Level::Inheriting { config })),
                Some(config) => match config.version.clone() {
                    Some(version) => {
                        return Ok(Some(Level::Defined {
                            kind,
                            config,
                            version,
                        }));
                    }
                    None => {
                        tracing::debug!(%location, "version.json declares no version, skipping");
                    }
                },
                None => {}
            },
        }
    }
    Ok(None)
}
