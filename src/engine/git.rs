use std::path::Path;

use tracing::debug;

use super::{run_checked, CommandRunner, CommandSpec};
use crate::error::DeployError;

/// Version control operations on a working copy.
#[derive(Debug)]
pub struct Git<'a, R> {
    runner: &'a R,
    repo_dir: &'a Path,
}

impl<'a, R: CommandRunner> Git<'a, R> {
    pub fn new(runner: &'a R, repo_dir: &'a Path) -> Self {
        Self { runner, repo_dir }
    }

    fn git<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("git").args(args).current_dir(self.repo_dir)
    }

    /// False when git is missing or the directory is not a working copy.
    pub async fn is_repository(&self) -> bool {
        let spec = self.git(["rev-parse", "--is-inside-work-tree"]).captured();
        match self.runner.run(&spec).await {
            Ok(output) => output.success() && output.stdout.trim() == "true",
            Err(e) => {
                debug!(error = %e, "git unavailable");
                false
            }
        }
    }

    /// Whether `file` (relative to the working copy) has local modifications.
    /// Untracked files never count, since checkout cannot restore them.
    pub async fn is_dirty(&self, file: &str) -> Result<bool, DeployError> {
        let spec = self
            .git(["status", "--porcelain", "--untracked-files=no", "--", file])
            .captured();
        let output = run_checked(self.runner, &spec).await?;
        Ok(!output.stdout.trim().is_empty())
    }

    /// Throw away local modifications to `file`.
    pub async fn discard(&self, file: &str) -> Result<(), DeployError> {
        let spec = self.git(["checkout", "--", file]);
        run_checked(self.runner, &spec).await.map(drop)
    }

    pub async fn pull(&self) -> Result<(), DeployError> {
        run_checked(self.runner, &self.git(["pull"])).await.map(drop)
    }
}
