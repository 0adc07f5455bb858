//! Command-line entry point.
//!
//! Prints a NerdBank.GitVersioning compatible version for a commit, computed
//! from the GitHub API instead of a local clone.
//!
//! Exit codes: `0` on success, `1` for invalid arguments and expected
//! version failures, `2` for anything else.

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use gitversioning_github::VersionError;
use gitversioning_github::commands::{
    self,
    GetVersionArgs,
};
use tracing_subscriber::EnvFilter;

/// `.env*` files dotenvage would read from `directory`.
fn env_files_in(directory: &Path, user: Option<&str>) -> Vec<PathBuf> {
    [".env", ".env.local", ".env.prod", ".env.dev", ".env.test"]
        .into_iter()
        .map(str::to_string)
        .chain(user.map(|user| format!(".env.{user}")))
        .map(|name| directory.join(name))
        .filter(|path| path.is_file())
        .collect()
}

/// Load `.env*` files from the current directory, where `GITHUB_TOKEN` may be
/// kept encrypted. Nothing is attempted when there are none.
#[allow(clippy::disallowed_methods)] // CLI tool needs direct env access
fn load_env_files() {
    let Ok(current_dir) = std::env::current_dir() else {
        return;
    };
    let user = std::env::var("USER").ok();
    if env_files_in(&current_dir, user.as_deref()).is_empty() {
        return;
    }

    if let Err(e) = dotenvage::EnvLoader::new().and_then(|loader| loader.load()) {
        eprintln!("Warning: Failed to load/decrypt env files: {}", e);
        eprintln!("Continuing with existing environment variables...");
    }
}

/// Diagnostics go to stderr so stdout only ever carries the version.
fn init_tracing(verbose: bool) {
    let default = if verbose { "gitversioning_github=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `1` for expected version failures, `2` for anything else.
fn exit_code(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<VersionError>().is_some() {
        1
    } else {
        2
    }
}

fn main() -> ExitCode {
    load_env_files();

    let args = match GetVersionArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    init_tracing(args.verbose);

    match commands::get_version(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            if code == 1 {
                eprintln!("Error: {e:#}");
            } else {
                eprintln!("{}", console::style(format!("Unexpected error: {e:?}")).red());
            }
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_version_errors_exit_with_one() {
        let error = anyhow::Error::from(VersionError::Cancelled);
        assert_eq!(exit_code(&error), 1);
    }

    #[test]
    fn test_version_error_behind_context_exits_with_one() {
        let error = Err::<(), _>(VersionError::Cancelled)
            .context("Failed to compute version")
            .unwrap_err();
        assert_eq!(exit_code(&error), 1);
    }

    #[test]
    fn test_other_errors_exit_with_two() {
        let error = anyhow::anyhow!("runtime exploded");
        assert_eq!(exit_code(&error), 2);
        let io = anyhow::Error::from(std::io::Error::other("disk"));
        assert_eq!(exit_code(&io), 2);
    }

    #[test]
    fn test_env_files_in() {
        let dir = tempfile::tempdir().unwrap();
        assert!(env_files_in(dir.path(), Some("alice")).is_empty());

        std::fs::write(dir.path().join(".env.alice"), "A=1").unwrap();
        std::fs::create_dir(dir.path().join(".env")).unwrap();
        assert!(env_files_in(dir.path(), None).is_empty());
        assert_eq!(
            env_files_in(dir.path(), Some("alice")),
            vec![dir.path().join(".env.alice")]
        );
    }
}
