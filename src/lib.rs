//! git-seed: bootstrap a git repository hosted on a WebDAV server
//!
//! Creates a bare repository in a temporary directory, waits for the
//! operator to copy it to the server, then clones it and pushes a seed
//! commit.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

pub use app::Seeder;
pub use config::SeedConfig;
pub use error::{AppError, Result};
