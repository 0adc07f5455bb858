//! Compute the version of a commit from the GitHub API.
//!
//! The version file (`version.txt` or `version.json`) is read from the local
//! working tree; its history, its content at past commits and the commit
//! distances come from GitHub. No clone of the history is needed, which makes
//! this usable from shallow CI checkouts.
//!
//! # Examples
//!
//! ```bash
//! # Version of a commit, project in the current directory
//! gitversioning-github octo widgets 4f2a9c1e... --accesstoken $GITHUB_TOKEN
//!
//! # In GitHub Actions: owner, repo and commit come from the environment
//! gitversioning-github -p src/Widgets
//!
//! # JSON output with the effective configuration
//! gitversioning-github --format json --include-defaults
//! ```

use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    Context,
    Result,
};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;

use super::common::{
    get_commit,
    get_owner_repo,
    project_directory,
    work_tree_root,
};
use crate::anchor::HeightAnchor;
use crate::config::{
    RenderOptions,
    render,
};
use crate::error::VersionError;
use crate::github::{
    Credentials,
    GitHubClient,
    RepoId,
    short_sha,
};
use crate::oracle::{
    VersionOracle,
    VersionOutcome,
    VersionRequest,
};
use crate::version::ResolvedSemVer;

const EXTENDED_HELP: &str = "\
Uses the GitHub API to calculate a build number for a commit,
using similar rules to NerdBank.GitVersioning.
Currently has a limited API - only a subset of features are
supported.";

/// Arguments for computing a version.
#[derive(Parser, Debug)]
#[command(
    name = "gitversioning-github",
    version,
    about = "Generates a NerdBank.GitVersioning compatible version number using the GitHub API",
    after_help = EXTENDED_HELP
)]
pub struct GetVersionArgs {
    /// The owner of the repository.
    ///
    /// Defaults to `GITHUB_REPOSITORY` or the git remote of the project.
    pub owner: Option<String>,

    /// The name of the repository.
    ///
    /// Defaults to `GITHUB_REPOSITORY` or the git remote of the project.
    pub repo: Option<String>,

    /// The SHA of the commit to version.
    ///
    /// Defaults to `GITHUB_SHA` or the local `HEAD`.
    pub commit: Option<String>,

    /// The path to the project or project directory.
    #[arg(short = 'p', long = "project", default_value = ".")]
    pub project: PathBuf,

    /// Root of the repository working tree.
    ///
    /// Version file paths sent to GitHub are relative to it. Defaults to the
    /// discovered git work tree, else the project directory.
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// The GitHub login for the user.
    ///
    /// When given, the access token is used as the password for basic auth.
    #[arg(short = 'l', long, env = "GITHUB_LOGIN")]
    pub login: Option<String>,

    /// The GitHub password or access token for the user.
    #[arg(
        short = 'a',
        long = "accesstoken",
        visible_alias = "access-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,

    /// Output format.
    ///
    /// - `version`: Print `Version: <version>`
    /// - `json`: Print the version, its parts, the anchor commit, the version
    ///   file paths and the effective configuration
    #[arg(long, default_value = "version", value_parser = ["version", "json"])]
    pub format: String,

    /// Include unset and default-valued settings in `--format json` output.
    #[arg(long)]
    pub include_defaults: bool,

    /// Log each inspected commit to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionReport<'a> {
    version: String,
    #[serde(flatten)]
    semver: &'a ResolvedSemVer,
    anchor: &'a HeightAnchor,
    config_directory: &'a Path,
    config_path: &'a str,
    version_path: &'a str,
    config: Value,
}

impl<'a> VersionReport<'a> {
    fn new(outcome: &'a VersionOutcome, options: RenderOptions) -> Self {
        Self {
            version: outcome.version.to_string(),
            semver: &outcome.version,
            anchor: &outcome.anchor,
            config_directory: &outcome.config_directory,
            config_path: &outcome.config_path,
            version_path: &outcome.version_path,
            config: render(&outcome.config, options),
        }
    }
}

/// Compute and print the version.
///
/// # Errors
///
/// Returns an error if the inputs cannot be determined, no version file
/// governs the project, or any GitHub query fails. Expected failures carry a
/// [`VersionError`].
pub fn get_version(args: GetVersionArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(get_version_async(args))
}

async fn get_version_async(args: GetVersionArgs) -> Result<()> {
    let mut logger = cargo_plugin_utils::logger::Logger::new();

    logger.status("Resolving", "project directory");
    let project_dir = project_directory(&args.project)?;
    let (owner, repo) = get_owner_repo(args.owner, args.repo, &project_dir)?;
    let commit = get_commit(args.commit, &project_dir)?;
    let repo_root = args
        .repo_root
        .unwrap_or_else(|| work_tree_root(&project_dir));

    let client = GitHubClient::new(Credentials::from_parts(args.login, args.access_token))
        .context("Failed to create GitHub API client")?;
    let request = VersionRequest {
        repo: RepoId::new(owner, repo),
        commit,
        project_dir,
        repo_root,
    };

    logger.status(
        "Computing",
        &format!("version of {} at {}", request.repo, short_sha(&request.commit)),
    );
    let oracle = VersionOracle::new(&client);
    let outcome = tokio::select! {
        outcome = oracle.compute(&request) => outcome?,
        Ok(()) = tokio::signal::ctrl_c() => return Err(VersionError::Cancelled.into()),
    };
    logger.finish();

    print_outcome(&outcome, &args.format, args.include_defaults)
}

fn print_outcome(outcome: &VersionOutcome, format: &str, include_defaults: bool) -> Result<()> {
    match format {
        "version" => println!("Version: {}", outcome.version),
        "json" => {
            let report = VersionReport::new(outcome, RenderOptions { include_defaults });
            println!("{}", serde_json::to_string(&report)?);
        }
        _ => anyhow::bail!("Invalid format: {}", format),
    }
    Ok(())
}
