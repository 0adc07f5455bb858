//! Command implementations.

mod common;
mod get_version;

pub use common::{
    detect_repo,
    get_commit,
    get_owner_repo,
    parse_github_remote,
};
pub use get_version::{
    GetVersionArgs,
    get_version,
};
