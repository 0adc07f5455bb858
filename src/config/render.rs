//! Render an effective configuration as `version.json`-shaped JSON.
//!
//! Which settings appear is controlled by [`RenderOptions`], not by the
//! configuration itself.

use serde_json::{
    Map,
    Value,
    json,
};

use super::{
    VersionConfig,
    VersionPrecision,
};

const DEFAULT_SEMVER1_PADDING: u32 = 4;
const DEFAULT_COMMIT_ID_FIXED_LENGTH: u32 = 10;

/// Output toggles for [`render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit settings that are unset or at their default value.
    pub include_defaults: bool,
}

/// Render `config` as a JSON object.
pub fn render(config: &VersionConfig, options: RenderOptions) -> Value {
    let mut out = Map::new();

    if let Some(version) = &config.version {
        out.insert("version".into(), json!(version.to_string()));
    }

    if let Some(assembly) = &config.assembly_version {
        let precision = assembly.precision_or_default();
        let value = if precision == VersionPrecision::default() && !options.include_defaults {
            json!(assembly.version.to_string())
        } else {
            json!({ "version": assembly.version.to_string(), "precision": precision })
        };
        out.insert("assemblyVersion".into(), value);
    }

    let mut setting = |name: &str, value: Option<Value>, default: Value| match value {
        Some(value) => {
            out.insert(name.into(), value);
        }
        None if options.include_defaults => {
            out.insert(name.into(), default);
        }
        None => {}
    };

    setting(
        "buildNumberOffset",
        config.build_number_offset.map(|v| json!(v)),
        json!(0),
    );
    setting(
        "semVer1NumericIdentifierPadding",
        config.sem_ver1_numeric_identifier_padding.map(|v| json!(v)),
        json!(DEFAULT_SEMVER1_PADDING),
    );
    setting(
        "gitCommitIdShortFixedLength",
        config.git_commit_id_short_fixed_length.map(|v| json!(v)),
        json!(DEFAULT_COMMIT_ID_FIXED_LENGTH),
    );
    setting(
        "gitCommitIdShortAutoMinimum",
        config.git_commit_id_short_auto_minimum.map(|v| json!(v)),
        json!(0),
    );
    setting(
        "publicReleaseRefSpec",
        config.public_release_ref_spec.as_ref().map(|v| json!(v)),
        json!([]),
    );

    if config.inherit || options.include_defaults {
        out.insert("inherit".into(), json!(config.inherit));
    }

    Value::Object(out)
}
