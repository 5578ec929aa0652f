//! Infrastructure services for git-seed.
//!
//! This module contains:
//! - GitService: git operations on the bare repository and the clone
//! - CommandRunner: external command execution
//! - Confirm: the operator confirmation for the manual upload

pub mod confirm;
mod git;
pub mod process;

pub use confirm::{Confirm, LineConfirm, UploadRequest};
pub use git::{GitService, DAEMON_EXPORT_FILE};
pub use process::{CommandOutput, CommandRunner, Invocation, SystemRunner};
