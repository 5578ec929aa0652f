//! The seeding sequence.
//!
//! [`Seeder`] runs the five steps in order, threading the directory each
//! command works in explicitly, and stops at the first failure.

use crate::config::SeedConfig;
use crate::domain::{Locations, SeedParams, SeedReport, SeedStep};
use crate::error::{AppError, Result};
use crate::services::{
    CommandRunner, Confirm, GitService, Invocation, UploadRequest, DAEMON_EXPORT_FILE,
};
use std::fs;
use std::future::Future;
use std::io::Write;

/// Runs the seeding sequence and reports progress to `out`
pub struct Seeder<'a, W: Write> {
    config: &'a SeedConfig,
    runner: &'a dyn CommandRunner,
    out: W,
}

/// Mark the running step as failed and return the step that failed
fn record_failure(report: &mut SeedReport, err: &AppError) -> Option<SeedStep> {
    if let Some(step) = report.running_step() {
        report.fail(step, err.to_string());
    }
    report.failed_step()
}

impl<'a, W: Write> Seeder<'a, W> {
    /// Create a seeder printing progress to `out`
    pub fn new(config: &'a SeedConfig, runner: &'a dyn CommandRunner, out: W) -> Self {
        Self {
            config,
            runner,
            out,
        }
    }

    /// Consume the seeder, returning the progress writer
    pub fn into_output(self) -> W {
        self.out
    }

    fn git(&self) -> GitService<'a> {
        GitService::new(self.config.git.program.clone(), self.runner)
    }

    /// Compute the locations for `params`
    pub fn locations(&self, params: &SeedParams) -> Result<Locations> {
        Ok(Locations::compute(
            &params.projects_loc,
            &params.repo_name,
            &params.url,
            &params.user,
            &self.config.temp_root(),
        )?)
    }

    /// Run every step. The returned report has all steps completed.
    pub fn run(&mut self, params: &SeedParams, confirm: &mut dyn Confirm) -> Result<SeedReport> {
        writeln!(self.out, "Attempting to create a new git repository.")?;

        let locations = self.locations(params)?;
        let mut report = SeedReport::new(locations.clone());

        let result = self.execute(params, &locations, &mut report, confirm);
        match result {
            Ok(()) => {
                tracing::info!("Seeding finished:\n{}", report.summary());
                Ok(report)
            }
            Err(err) => {
                match record_failure(&mut report, &err) {
                    Some(step) => {
                        tracing::warn!("Seeding stopped at {}:\n{}", step, report.summary())
                    }
                    None => tracing::warn!("Seeding stopped:\n{}", report.summary()),
                }
                Err(err)
            }
        }
    }

    fn begin(&mut self, report: &mut SeedReport, step: SeedStep) -> Result<()> {
        writeln!(self.out, "{} -", step)?;
        report.start(step);
        Ok(())
    }

    fn execute(
        &mut self,
        params: &SeedParams,
        locations: &Locations,
        report: &mut SeedReport,
        confirm: &mut dyn Confirm,
    ) -> Result<()> {
        self.begin(report, SeedStep::ValidateParameters)?;
        writeln!(self.out, " The local location is {}", locations.local.display())?;
        writeln!(self.out, " and the remote location is {}", locations.remote)?;
        report.complete(SeedStep::ValidateParameters);

        self.begin(report, SeedStep::CreateBareRepository)?;
        self.create_bare_repository(locations)?;
        report.complete(SeedStep::CreateBareRepository);

        self.begin(report, SeedStep::Upload)?;
        self.await_upload(locations, confirm)?;
        report.complete(SeedStep::Upload);

        self.begin(report, SeedStep::Clone)?;
        self.clone_remote(params, locations)?;
        report.complete(SeedStep::Clone);

        self.begin(report, SeedStep::SeedCommit)?;
        self.seed_commit(locations)?;
        report.complete(SeedStep::SeedCommit);

        writeln!(
            self.out,
            "Repository {} is ready at {}",
            params.repo_name,
            locations.local.display()
        )?;
        Ok(())
    }

    fn create_bare_repository(&mut self, locations: &Locations) -> Result<()> {
        let bare = locations.bare_repo();
        writeln!(self.out, " The temporary location is {}", bare.display())?;

        if bare.exists() {
            tracing::info!("Removing stale {}", bare.display());
            fs::remove_dir_all(&bare).map_err(|e| AppError::fs("remove", &bare, e))?;
        }
        fs::create_dir(&bare).map_err(|e| AppError::fs("create", &bare, e))?;

        let git = self.git();
        git.init_bare(&bare)?;
        git.set_head(&bare, &self.config.git.default_branch)?;
        git.mark_exportable(&bare)?;
        git.update_server_info(&bare)?;
        git.enable_post_update_hook(&bare)?;
        Ok(())
    }

    fn await_upload(&mut self, locations: &Locations, confirm: &mut dyn Confirm) -> Result<()> {
        let bare = locations.bare_repo();
        writeln!(self.out, " The remote location is {}", locations.remote)?;
        writeln!(
            self.out,
            " Please copy {} to {} and hit enter",
            bare.display(),
            locations.remote
        )?;
        self.out.flush()?;

        let request = UploadRequest {
            bare_repo: bare,
            remote: locations.remote.clone(),
        };
        if !confirm.confirm_upload(&request)? {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    fn clone_remote(&mut self, params: &SeedParams, locations: &Locations) -> Result<()> {
        writeln!(
            self.out,
            " Pulling {} to {}",
            locations.remote,
            params.projects_loc.display()
        )?;

        if locations.local.exists() {
            return Err(AppError::LocalExists(locations.local.clone()));
        }

        let root = &params.projects_loc;
        if !root.exists() {
            tracing::info!("Creating {}", root.display());
            fs::create_dir(root).map_err(|e| AppError::fs("create", root, e))?;
        }

        self.git()
            .clone_repo(root, &locations.remote, &params.repo_name)?;
        Ok(())
    }

    fn seed_commit(&mut self, locations: &Locations) -> Result<()> {
        let repo = &locations.local;
        let seed = &self.config.seed;
        let branch = &self.config.git.default_branch;
        let git = self.git();

        git.set_head(repo, branch)?;

        writeln!(self.out, " Touching {}", seed.file_name)?;
        let seed_file = repo.join(&seed.file_name);
        fs::write(&seed_file, b"").map_err(|e| AppError::fs("create", &seed_file, e))?;

        writeln!(self.out, " Checkin and commit {}", seed.file_name)?;
        git.add(repo, &seed.file_name)?;
        git.commit(repo, &seed.commit_message)?;

        writeln!(self.out, " Pushing {} to {}", branch, self.config.git.remote)?;
        git.push(repo, &self.config.git.remote, branch)?;
        Ok(())
    }

    /// Describe what [`Seeder::run`] would do, without doing it
    pub fn plan(&self, params: &SeedParams) -> Result<String> {
        let locations = self.locations(params)?;
        let bare = locations.bare_repo();
        let repo = &locations.local;
        let root = &params.projects_loc;
        let git = self.git();
        let branch = &self.config.git.default_branch;
        let seed = &self.config.seed;

        let mut plan = String::new();
        let mut line = |text: String| {
            plan.push_str(&text);
            plan.push('\n');
        };
        let cmd = |invocation: Invocation| {
            format!("  [{}] {}", invocation.cwd.display(), invocation.command_line())
        };

        line(locations.to_string());
        line(SeedStep::CreateBareRepository.to_string());
        line(format!("  remove {} if present", bare.display()));
        line(format!("  create {}", bare.display()));
        line(cmd(git.init_bare_invocation(&bare)));
        line(cmd(git.set_head_invocation(&bare, branch)));
        line(format!("  create {}", bare.join(DAEMON_EXPORT_FILE).display()));
        line(cmd(git.update_server_info_invocation(&bare)));
        line(format!("  activate {}", bare.join("hooks").join("post-update").display()));
        line(SeedStep::Upload.to_string());
        line(format!("  wait for {} to be copied to {}", bare.display(), locations.remote));
        line(SeedStep::Clone.to_string());
        line(format!("  abort if {} exists", repo.display()));
        line(format!("  create {} if missing", root.display()));
        line(cmd(git.clone_invocation(root, &locations.remote, &params.repo_name)));
        line(SeedStep::SeedCommit.to_string());
        line(cmd(git.set_head_invocation(repo, branch)));
        line(format!("  create {}", repo.join(&seed.file_name).display()));
        line(cmd(git.add_invocation(repo, &seed.file_name)));
        line(cmd(git.commit_invocation(repo, &seed.commit_message)));
        line(cmd(git.push_invocation(repo, &self.config.git.remote, branch)));

        Ok(plan)
    }
}

/// Run a blocking job on the blocking pool, racing it against `interrupt`.
///
/// Returns `None` when `interrupt` finishes first; the job is abandoned.
pub async fn run_until_interrupted<T, F, I>(job: F, interrupt: I) -> Option<anyhow::Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    I: Future<Output = ()>,
{
    let handle = tokio::task::spawn_blocking(job);
    tokio::select! {
        joined = handle => Some(joined.map_err(anyhow::Error::from).and_then(|result| result)),
        _ = interrupt => {
            tracing::info!("Received Ctrl+C, aborting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GitError, ProcessError};
    use crate::services::{CommandOutput, SystemRunner};
    use std::cell::RefCell;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::process::Command;
    use tempfile::TempDir;

    /// Records invocations; `clone` creates its target so later steps can run
    #[derive(Default)]
    struct FakeRunner {
        calls: RefCell<Vec<Invocation>>,
        fail_on: Option<&'static str>,
    }

    impl FakeRunner {
        fn failing_on(subcommand: &'static str) -> Self {
            Self {
                fail_on: Some(subcommand),
                ..Self::default()
            }
        }

        fn command_lines(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|call| call.command_line())
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> std::result::Result<CommandOutput, ProcessError> {
            self.calls.borrow_mut().push(invocation.clone());
            let args: Vec<String> = invocation
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();

            if self.fail_on.is_some_and(|sub| args.iter().any(|a| a == sub)) {
                return Ok(CommandOutput {
                    code: Some(128),
                    stdout: String::new(),
                    stderr: "fatal: simulated failure".to_string(),
                });
            }
            if args.first().map(String::as_str) == Some("clone") {
                if let Some(target) = args.last() {
                    std::fs::create_dir(invocation.cwd.join(target)).unwrap();
                }
            }
            Ok(CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        config: SeedConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().to_path_buf();
            std::fs::create_dir(root.join("scratch")).unwrap();

            let mut config = SeedConfig::default();
            config.paths.temp_dir = Some(root.join("scratch"));
            Self {
                _temp: temp,
                root,
                config,
            }
        }

        fn params(&self) -> SeedParams {
            SeedParams::new(self.root.join("proj"), "Demo", "alice", "http://host/repos").unwrap()
        }

        fn bare(&self) -> PathBuf {
            self.root.join("scratch").join("Demo.git")
        }
    }

    fn confirm_yes() -> impl FnMut(&UploadRequest) -> io::Result<bool> {
        |_: &UploadRequest| -> io::Result<bool> { Ok(true) }
    }

    fn copy_dir_all(from: &Path, to: &Path) -> io::Result<()> {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            let target = to.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                copy_dir_all(&entry.path(), &target)?;
            } else {
                std::fs::copy(entry.path(), target)?;
            }
        }
        Ok(())
    }

    fn git_stdout(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    #[test]
    fn test_command_sequence_and_directories() {
        let fixture = Fixture::new();
        let runner = FakeRunner::default();
        let mut seeder = Seeder::new(&fixture.config, &runner, Vec::new());

        let report = seeder
            .run(&fixture.params(), &mut confirm_yes())
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(
            runner.command_lines(),
            vec![
                "git --bare init",
                "git symbolic-ref HEAD refs/heads/master",
                "git --bare update-server-info",
                "git clone http://alice@host/repos/Demo.git Demo",
                "git symbolic-ref HEAD refs/heads/master",
                "git add README",
                "git commit -m Seeding repository",
                "git push -u origin master",
            ]
        );

        let calls = runner.calls.borrow();
        let local = fixture.root.join("proj").join("Demo");
        assert_eq!(calls[0].cwd, fixture.bare());
        assert_eq!(calls[3].cwd, fixture.root.join("proj"));
        assert!(calls[4..].iter().all(|call| call.cwd == local));

        assert!(fixture.bare().join(DAEMON_EXPORT_FILE).exists());
        assert!(local.join("README").exists());
    }

    #[test]
    fn test_progress_output() {
        let fixture = Fixture::new();
        let runner = FakeRunner::default();
        let mut seeder = Seeder::new(&fixture.config, &runner, Vec::new());

        seeder.run(&fixture.params(), &mut confirm_yes()).unwrap();
        let output = String::from_utf8(seeder.into_output()).unwrap();

        assert!(output.starts_with("Attempting to create a new git repository.\n"));
        assert!(output.contains("Step 1 - validating parameters -"));
        assert!(output.contains(" and the remote location is http://alice@host/repos/Demo.git"));
        assert!(output.contains(&format!(
            " Please copy {} to http://alice@host/repos/Demo.git and hit enter",
            fixture.bare().display()
        )));
        assert!(output.contains("Step 5 - creating, committing, and pushing a seed file -"));
    }

    #[test]
    fn test_confirmation_sees_locations() {
        let fixture = Fixture::new();
        let runner = FakeRunner::default();
        let mut seeder = Seeder::new(&fixture.config, &runner, io::sink());
        let mut requests = Vec::new();

        let mut confirm = |req: &UploadRequest| {
            requests.push(req.clone());
            Ok::<_, io::Error>(true)
        };
        seeder.run(&fixture.params(), &mut confirm).unwrap();

        assert_eq!(
            requests,
            vec![UploadRequest {
                bare_repo: fixture.bare(),
                remote: "http://alice@host/repos/Demo.git".to_string(),
            }]
        );
    }

    #[test]
    fn test_existing_local_location_aborts_before_clone() {
        let fixture = Fixture::new();
        let local = fixture.root.join("proj").join("Demo");
        std::fs::create_dir_all(&local).unwrap();
        let runner = FakeRunner::default();
        let mut seeder = Seeder::new(&fixture.config, &runner, io::sink());

        let err = seeder
            .run(&fixture.params(), &mut confirm_yes())
            .unwrap_err();

        assert!(matches!(err, AppError::LocalExists(ref path) if *path == local));
        assert_eq!(err.exit_code(), 1);
        assert!(!runner.command_lines().iter().any(|c| c.contains("clone")));
        assert_eq!(std::fs::read_dir(&local).unwrap().count(), 0);
    }

    #[test]
    fn test_stale_temporary_repository_is_recreated() {
        let fixture = Fixture::new();
        std::fs::create_dir(fixture.bare()).unwrap();
        std::fs::write(fixture.bare().join("leftover"), "old run").unwrap();
        let runner = FakeRunner::default();
        let mut seeder = Seeder::new(&fixture.config, &runner, io::sink());

        // Stop at the upload step
        let mut decline = |_: &UploadRequest| Ok::<_, io::Error>(false);
        let err = seeder.run(&fixture.params(), &mut decline).unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert!(!fixture.bare().join("leftover").exists());
        assert!(fixture.bare().join(DAEMON_EXPORT_FILE).exists());
        assert!(!fixture.root.join("proj").exists());
    }

    #[test]
    fn test_failed_command_stops_the_sequence() {
        let fixture = Fixture::new();
        let runner = FakeRunner::failing_on("commit");
        let mut seeder = Seeder::new(&fixture.config, &runner, io::sink());

        let err = seeder
            .run(&fixture.params(), &mut confirm_yes())
            .unwrap_err();

        match err {
            AppError::Git(GitError::CommandFailed { command, stderr, .. }) => {
                assert_eq!(command, "git commit -m Seeding repository");
                assert_eq!(stderr, "fatal: simulated failure");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!runner.command_lines().iter().any(|c| c.contains("push")));
    }

    #[test]
    fn test_record_failure_marks_running_step() {
        let fixture = Fixture::new();
        let runner = FakeRunner::default();
        let seeder = Seeder::new(&fixture.config, &runner, io::sink());
        let mut report = SeedReport::new(seeder.locations(&fixture.params()).unwrap());
        report.start(SeedStep::ValidateParameters);
        report.complete(SeedStep::ValidateParameters);
        report.start(SeedStep::CreateBareRepository);

        let failed = record_failure(&mut report, &AppError::Cancelled);

        assert_eq!(failed, Some(SeedStep::CreateBareRepository));
        assert!(report.summary().contains("FAILED Step 2"));
        assert_eq!(report.running_step(), None);

        let mut untouched = SeedReport::new(report.locations.clone());
        assert_eq!(record_failure(&mut untouched, &AppError::Cancelled), None);
    }

    #[test]
    fn test_project_root_is_not_created_recursively() {
        let fixture = Fixture::new();
        let runner = FakeRunner::default();
        let params =
            SeedParams::new(fixture.root.join("a").join("b"), "Demo", "alice", "http://host")
                .unwrap();
        let mut seeder = Seeder::new(&fixture.config, &runner, io::sink());

        let err = seeder.run(&params, &mut confirm_yes()).unwrap_err();

        assert!(matches!(err, AppError::Fs { action: "create", .. }));
        assert!(!fixture.root.join("a").exists());
    }

    #[test]
    fn test_plan() {
        let mut config = SeedConfig::default();
        config.paths.temp_dir = Some(PathBuf::from("/tmp/scratch"));
        let runner = FakeRunner::default();
        let seeder = Seeder::new(&config, &runner, io::sink());
        let params = SeedParams::new("/srv/proj", "Demo", "alice", "http://host/repos").unwrap();

        let plan = seeder.plan(&params).unwrap();

        assert!(runner.calls.borrow().is_empty());
        insta::assert_snapshot!(plan, @r###"
        local:     /srv/proj/Demo
        remote:    http://alice@host/repos/Demo.git
        temporary: /tmp/scratch/Demo.git
        Step 2 - creating a bare repository in a temporary directory
          remove /tmp/scratch/Demo.git if present
          create /tmp/scratch/Demo.git
          [/tmp/scratch/Demo.git] git --bare init
          [/tmp/scratch/Demo.git] git symbolic-ref HEAD refs/heads/master
          create /tmp/scratch/Demo.git/git-daemon-export-ok
          [/tmp/scratch/Demo.git] git --bare update-server-info
          activate /tmp/scratch/Demo.git/hooks/post-update
        Step 3 - uploading the repository to the remote location
          wait for /tmp/scratch/Demo.git to be copied to http://alice@host/repos/Demo.git
        Step 4 - cloning the repository from the remote location
          abort if /srv/proj/Demo exists
          create /srv/proj if missing
          [/srv/proj] git clone http://alice@host/repos/Demo.git Demo
        Step 5 - creating, committing, and pushing a seed file
          [/srv/proj/Demo] git symbolic-ref HEAD refs/heads/master
          create /srv/proj/Demo/README
          [/srv/proj/Demo] git add README
          [/srv/proj/Demo] git commit -m Seeding repository
          [/srv/proj/Demo] git push -u origin master
        "###);
    }

    #[test]
    fn test_seeds_repository_end_to_end() {
        let fixture = Fixture::new();
        let server = fixture.root.join("server");
        std::fs::create_dir(&server).unwrap();

        // Serve http://alice@host/repos/ from a local directory
        let runner = SystemRunner::new()
            .env("GIT_CONFIG_COUNT", "1")
            .env(
                "GIT_CONFIG_KEY_0",
                format!("url.{}/.insteadOf", server.display()),
            )
            .env("GIT_CONFIG_VALUE_0", "http://alice@host/repos/")
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@test.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@test.com");

        let mut upload = |req: &UploadRequest| {
            copy_dir_all(&req.bare_repo, &server.join("Demo.git"))?;
            Ok::<_, io::Error>(true)
        };
        let mut seeder = Seeder::new(&fixture.config, &runner, Vec::new());
        let report = seeder.run(&fixture.params(), &mut upload).unwrap();

        assert!(report.is_complete());
        let output = String::from_utf8(seeder.into_output()).unwrap();
        assert!(output.contains("http://alice@host/repos/Demo.git"));

        let local = fixture.root.join("proj").join("Demo");
        assert!(local.join(".git").is_dir());
        assert!(local.join("README").is_file());

        let remote = server.join("Demo.git");
        assert_eq!(
            git_stdout(&remote, &["ls-tree", "-r", "--name-only", "master"]),
            "README\n"
        );
        assert_eq!(
            git_stdout(&remote, &["log", "--format=%s", "master"]),
            "Seeding repository\n"
        );
        assert!(fixture.bare().join("hooks").join("post-update").exists());
    }

    #[test]
    fn test_run_until_interrupted_returns_job_result() {
        let result = tokio_test::block_on(run_until_interrupted(
            || Ok(42),
            std::future::pending::<()>(),
        ));
        assert_eq!(result.unwrap().unwrap(), 42);
    }

    #[test]
    fn test_run_until_interrupted_stops_on_interrupt() {
        let result = tokio_test::block_on(run_until_interrupted(
            || {
                std::thread::sleep(std::time::Duration::from_millis(200));
                Ok(())
            },
            std::future::ready(()),
        ));
        assert!(result.is_none());
    }
}
