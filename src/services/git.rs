//! Git service for the bare repository and the seeded clone.
//!
//! Uses the git CLI through a [`CommandRunner`]. Every operation takes the
//! directory it works in and fails on a non-zero exit status.

use super::process::{CommandOutput, CommandRunner, Invocation};
use crate::error::{GitError, GitResult};
use std::fs;
use std::path::Path;

/// Marker file that lets git-daemon export a repository
pub const DAEMON_EXPORT_FILE: &str = "git-daemon-export-ok";

const POST_UPDATE_HOOK: &str = "#!/bin/sh\nexec git update-server-info\n";

/// Git operations for a seeding run
pub struct GitService<'a> {
    program: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> GitService<'a> {
    /// Create a service running `program` through `runner`
    pub fn new(program: impl Into<String>, runner: &'a dyn CommandRunner) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn git(&self, cwd: &Path) -> Invocation {
        Invocation::new(self.program.clone(), cwd)
    }

    fn run(&self, invocation: Invocation) -> GitResult<CommandOutput> {
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(GitError::CommandFailed {
                command: invocation.command_line(),
                status: output.status_text(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    pub fn init_bare_invocation(&self, dir: &Path) -> Invocation {
        self.git(dir).args(["--bare", "init"])
    }

    pub fn set_head_invocation(&self, dir: &Path, branch: &str) -> Invocation {
        self.git(dir)
            .args(["symbolic-ref", "HEAD"])
            .arg(format!("refs/heads/{}", branch))
    }

    pub fn update_server_info_invocation(&self, dir: &Path) -> Invocation {
        self.git(dir).args(["--bare", "update-server-info"])
    }

    pub fn clone_invocation(&self, parent: &Path, remote: &str, name: &str) -> Invocation {
        self.git(parent).arg("clone").arg(remote).arg(name)
    }

    pub fn add_invocation(&self, repo: &Path, file: &str) -> Invocation {
        self.git(repo).arg("add").arg(file)
    }

    pub fn commit_invocation(&self, repo: &Path, message: &str) -> Invocation {
        self.git(repo).args(["commit", "-m"]).arg(message)
    }

    pub fn push_invocation(&self, repo: &Path, remote: &str, branch: &str) -> Invocation {
        self.git(repo).args(["push", "-u"]).arg(remote).arg(branch)
    }

    /// Initialize a bare repository in an existing, empty directory
    pub fn init_bare(&self, dir: &Path) -> GitResult<()> {
        self.run(self.init_bare_invocation(dir))?;
        Ok(())
    }

    /// Point HEAD at `branch`; works on unborn branches
    pub fn set_head(&self, dir: &Path, branch: &str) -> GitResult<()> {
        self.run(self.set_head_invocation(dir, branch))?;
        Ok(())
    }

    /// Regenerate the info files dumb HTTP clients need
    pub fn update_server_info(&self, dir: &Path) -> GitResult<()> {
        self.run(self.update_server_info_invocation(dir))?;
        Ok(())
    }

    /// Create the daemon export marker in a bare repository
    pub fn mark_exportable(&self, dir: &Path) -> GitResult<()> {
        fs::write(dir.join(DAEMON_EXPORT_FILE), b"")?;
        Ok(())
    }

    /// Activate the post-update hook of a bare repository.
    ///
    /// Renames the shipped sample; writes an equivalent hook when git was
    /// installed without templates.
    pub fn enable_post_update_hook(&self, dir: &Path) -> GitResult<()> {
        let hooks = dir.join("hooks");
        let sample = hooks.join("post-update.sample");
        let hook = hooks.join("post-update");

        if sample.exists() {
            fs::rename(&sample, &hook)?;
        } else {
            tracing::warn!(
                "No post-update sample in {}, writing a default hook",
                hooks.display()
            );
            fs::create_dir_all(&hooks)?;
            fs::write(&hook, POST_UPDATE_HOOK)?;
        }
        make_executable(&hook)?;
        Ok(())
    }

    /// Clone `remote` into `parent/name`
    pub fn clone_repo(&self, parent: &Path, remote: &str, name: &str) -> GitResult<()> {
        self.run(self.clone_invocation(parent, remote, name))?;
        Ok(())
    }

    /// Stage a file
    pub fn add(&self, repo: &Path, file: &str) -> GitResult<()> {
        self.run(self.add_invocation(repo, file))?;
        Ok(())
    }

    /// Commit the index
    pub fn commit(&self, repo: &Path, message: &str) -> GitResult<()> {
        self.run(self.commit_invocation(repo, message))?;
        Ok(())
    }

    /// Push `branch` to `remote` and track it
    pub fn push(&self, repo: &Path, remote: &str, branch: &str) -> GitResult<()> {
        self.run(self.push_invocation(repo, remote, branch))?;
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
