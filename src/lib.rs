#![doc = include_str!("../README.md")]

/// Height anchor search over a version file's history.
pub mod anchor;
/// Command implementations and argument types.
pub mod commands;
/// Version file discovery, parsing and rendering.
pub mod config;
pub mod error;
/// GitHub API access.
pub mod github;
pub mod height;
pub mod history;
pub mod oracle;
/// Version helpers.
pub mod version;

#[cfg(test)]
mod testing;

pub use error::{
    HostError,
    VersionError,
};
pub use oracle::{
    VersionOracle,
    VersionOutcome,
    VersionRequest,
};
