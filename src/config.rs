//! Configuration management for git-seed.
//!
//! Supports layered configuration: defaults → user → explicit file → env

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub seed: SeedFileConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl SeedConfig {
    /// Load configuration with hierarchy: defaults → user → explicit file → env
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. User config (~/.config/git-seed/config.toml)
        if let Some(config_dir) = directories::ProjectDirs::from("net", "git-seed", "git-seed") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                tracing::debug!("Loading user config from {}", user_config.display());
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 3. File given on the command line
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        // 4. Environment variables (GIT_SEED_*)
        builder = builder.add_source(
            Environment::with_prefix("GIT_SEED")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.git.program.trim().is_empty() {
            return Err(ConfigError::Invalid("git.program must not be empty".into()));
        }
        if self.git.default_branch.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "git.default_branch must not be empty".into(),
            ));
        }
        if self.seed.file_name.is_empty() || self.seed.file_name.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "seed.file_name '{}' must be a plain file name",
                self.seed.file_name
            )));
        }
        Ok(())
    }

    /// Root directory for the temporary bare repository
    pub fn temp_root(&self) -> PathBuf {
        self.paths
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Git invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable
    #[serde(default = "default_program")]
    pub program: String,
    /// Branch the seed commit is pushed to
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Remote name created by clone
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            default_branch: default_branch(),
            remote: default_remote(),
        }
    }
}

fn default_program() -> String {
    "git".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// The file committed into the new repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFileConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for SeedFileConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            commit_message: default_commit_message(),
        }
    }
}

fn default_file_name() -> String {
    "README".to_string()
}

fn default_commit_message() -> String {
    "Seeding repository".to_string()
}

/// Filesystem locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Overrides the system temporary directory
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}
