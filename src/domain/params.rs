//! The four operator-supplied parameters of a run.

use crate::error::LocationError;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Repository names are used verbatim as a directory name and a URL segment,
/// so separators and control characters are out.
fn repo_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^/\\\p{Cc}]+$").expect("valid repo name pattern"))
}

/// Validated parameters for one seeding run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedParams {
    /// Directory the repository is cloned under
    pub projects_loc: PathBuf,
    /// Repository name
    pub repo_name: String,
    /// WebDAV account inserted into the remote URL
    pub user: String,
    /// Base URL of the WebDAV endpoint
    pub url: String,
}

impl SeedParams {
    /// Validate raw parameters
    pub fn new(
        projects_loc: impl Into<PathBuf>,
        repo_name: impl Into<String>,
        user: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, LocationError> {
        let params = Self {
            projects_loc: projects_loc.into(),
            repo_name: repo_name.into(),
            user: user.into(),
            url: url.into(),
        };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), LocationError> {
        if self.projects_loc.as_os_str().is_empty() {
            return Err(LocationError::Empty("projectsloc"));
        }
        if self.repo_name.is_empty() {
            return Err(LocationError::Empty("reponame"));
        }
        if self.user.is_empty() {
            return Err(LocationError::Empty("user"));
        }
        if self.url.is_empty() {
            return Err(LocationError::Empty("url"));
        }

        if !repo_name_pattern().is_match(&self.repo_name)
            || self.repo_name == "."
            || self.repo_name == ".."
        {
            return Err(LocationError::InvalidRepoName(self.repo_name.clone()));
        }
        if self.user.contains(&['@', ':', '/'][..]) {
            return Err(LocationError::InvalidUser(self.user.clone()));
        }
        if !self.url.contains("://") {
            return Err(LocationError::MissingScheme(self.url.clone()));
        }
        Ok(())
    }
}
