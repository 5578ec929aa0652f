//! Derived locations for a seeding run.
//!
//! Everything here is a pure string/path transform; nothing touches the
//! filesystem.

use crate::error::LocationError;
use std::fmt;
use std::path::{Path, PathBuf};

const SCHEME_SEPARATOR: &str = "://";

/// Where the clone of the new repository ends up: `root/name`.
///
/// A trailing separator on `root` makes no difference.
pub fn local_location(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// The URL the operator uploads to and the clone is made from.
///
/// `user@` goes right after the first `://`, then `name.git` is appended
/// under a single `/`.
pub fn remote_location(name: &str, url: &str, user: &str) -> Result<String, LocationError> {
    if !url.contains(SCHEME_SEPARATOR) {
        return Err(LocationError::MissingScheme(url.to_string()));
    }

    let with_user = format!("{}{}@", SCHEME_SEPARATOR, user);
    let mut remote = url.replacen(SCHEME_SEPARATOR, &with_user, 1);
    if !remote.ends_with('/') {
        remote.push('/');
    }
    remote.push_str(name);
    remote.push_str(".git");
    Ok(remote)
}

/// `<system temp dir>/<name>`
pub fn temp_location(name: &str) -> PathBuf {
    temp_location_in(&std::env::temp_dir(), name)
}

/// `<root>/<name>`
pub fn temp_location_in(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

/// The three locations a run works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// Clone target under the project root
    pub local: PathBuf,
    /// Remote repository URL including the user
    pub remote: String,
    /// Temporary location, without the `.git` suffix
    pub temp: PathBuf,
}

impl Locations {
    /// Compute all locations for a run
    pub fn compute(
        projects_loc: &Path,
        repo_name: &str,
        url: &str,
        user: &str,
        temp_root: &Path,
    ) -> Result<Self, LocationError> {
        Ok(Self {
            local: local_location(projects_loc, repo_name),
            remote: remote_location(repo_name, url, user)?,
            temp: temp_location_in(temp_root, repo_name),
        })
    }

    /// The bare repository directory: the temp location plus `.git`
    pub fn bare_repo(&self) -> PathBuf {
        let mut path = self.temp.clone().into_os_string();
        path.push(".git");
        PathBuf::from(path)
    }
}

impl fmt::Display for Locations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "local:     {}", self.local.display())?;
        writeln!(f, "remote:    {}", self.remote)?;
        write!(f, "temporary: {}", self.bare_repo().display())
    }
}
