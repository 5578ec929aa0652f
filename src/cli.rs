//! Command-line interface.

use crate::domain::SeedParams;
use crate::error::LocationError;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Flags that are also accepted with a single leading dash (`-reponame`)
pub const LEGACY_FLAGS: [&str; 4] = ["projectsloc", "reponame", "user", "url"];

/// Flags whose value may follow as a separate argument
const VALUE_FLAGS: [&str; 5] = ["projectsloc", "reponame", "user", "url", "config"];

/// Create a bare git repository, wait for it to be copied to a WebDAV
/// server, then clone it locally and push a first commit.
#[derive(Debug, Parser)]
#[command(name = "git-seed")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory the repository is cloned under
    #[arg(long = "projectsloc", value_name = "PATH")]
    pub projects_loc: PathBuf,

    /// Repository name, used as directory name and remote path segment
    #[arg(long = "reponame", value_name = "NAME")]
    pub repo_name: String,

    /// WebDAV user inserted into the remote URL
    #[arg(long, value_name = "USERNAME")]
    pub user: String,

    /// Base URL of the WebDAV server, e.g. http://foo.bar.com/repos
    #[arg(long, value_name = "BASE-URL")]
    pub url: String,

    /// Extra configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the locations and planned commands without running them
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse the process arguments, accepting the single-dash flag forms
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Validated run parameters
    pub fn params(&self) -> Result<SeedParams, LocationError> {
        SeedParams::new(
            self.projects_loc.clone(),
            self.repo_name.clone(),
            self.user.clone(),
            self.url.clone(),
        )
    }

    /// Like [`Cli::params`], but reports failures as a usage error
    pub fn usage_params(&self) -> Result<SeedParams, clap::Error> {
        self.params()
            .map_err(|err| Self::command().error(ErrorKind::ValueValidation, err))
    }
}

/// Rewrite `-projectsloc` style flags to `--projectsloc`.
///
/// Only arguments in flag position are rewritten: values of the preceding
/// flag and everything after `--` are left alone.
pub fn normalize_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut passthrough = false;
    let mut value_next = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough || std::mem::take(&mut value_next) {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            let arg: OsString = match arg.to_str().and_then(legacy_flag) {
                Some(rewritten) => rewritten.into(),
                None => arg,
            };
            value_next = arg.to_str().map_or(false, takes_separate_value);
            arg
        })
        .collect()
}

fn takes_separate_value(arg: &str) -> bool {
    arg.strip_prefix("--")
        .map_or(false, |name| VALUE_FLAGS.contains(&name))
}

fn legacy_flag(arg: &str) -> Option<String> {
    let flag = arg.strip_prefix('-')?;
    if flag.starts_with('-') {
        return None;
    }
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    LEGACY_FLAGS
        .contains(&name)
        .then(|| format!("-{}", arg))
}
