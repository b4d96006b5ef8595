use std::path::Path;

use tracing::debug;

use super::{run_checked, CommandRunner, CommandSpec};
use crate::error::DeployError;

const DOCKER_INSTALL_URL: &str = "https://docs.docker.com/get-docker/";

/// Options for `docker compose up`, which always runs detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpOptions<'a> {
    /// Start only this service instead of the whole topology.
    pub service: Option<&'a str>,
    pub remove_orphans: bool,
}

/// The container engine, driven through the `docker compose` CLI from the
/// project directory so it picks up the descriptor and settings file there.
#[derive(Debug)]
pub struct ComposeEngine<'a, R> {
    runner: &'a R,
    project_dir: &'a Path,
}

impl<'a, R: CommandRunner> ComposeEngine<'a, R> {
    pub fn new(runner: &'a R, project_dir: &'a Path) -> Self {
        Self {
            runner,
            project_dir,
        }
    }

    fn compose<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("docker")
            .arg("compose")
            .args(args)
            .current_dir(self.project_dir)
    }

    /// Verify that docker and the Compose v2 plugin are installed.
    pub async fn check_installed(&self) -> Result<(), DeployError> {
        let version = CommandSpec::new("docker").arg("--version").captured();
        match self.runner.run(&version).await {
            Ok(output) if output.success() => {
                debug!(version = %output.stdout.trim(), "docker detected");
            }
            _ => {
                return Err(DeployError::MissingPrerequisite {
                    tool: "docker".to_string(),
                    remedy: format!("Install Docker from {DOCKER_INSTALL_URL}, then re-run."),
                })
            }
        }

        let compose_version = self.compose(["version"]).captured();
        match self.runner.run(&compose_version).await {
            Ok(output) if output.success() => Ok(()),
            _ => Err(DeployError::MissingPrerequisite {
                tool: "Docker Compose v2".to_string(),
                remedy: format!(
                    "`docker compose version` failed. Upgrade Docker ({DOCKER_INSTALL_URL}) to get the compose plugin."
                ),
            }),
        }
    }

    pub async fn pull(&self, service: Option<&str>) -> Result<(), DeployError> {
        let spec = self.compose(["pull"]).args(service);
        run_checked(self.runner, &spec).await.map(drop)
    }

    pub async fn up(&self, options: UpOptions<'_>) -> Result<(), DeployError> {
        let mut spec = self.compose(["up", "-d"]);
        if options.remove_orphans {
            spec = spec.arg("--remove-orphans");
        }
        let spec = spec.args(options.service);
        run_checked(self.runner, &spec).await.map(drop)
    }

    pub async fn down(&self) -> Result<(), DeployError> {
        run_checked(self.runner, &self.compose(["down"])).await.map(drop)
    }

    pub async fn build(&self, service: &str) -> Result<(), DeployError> {
        let spec = self.compose(["build", service]);
        run_checked(self.runner, &spec).await.map(drop)
    }

    /// Run `command` inside a running service container without a TTY and
    /// report whether it exited successfully. Never fails: an engine that
    /// cannot run the probe counts as "not yet".
    pub async fn exec_succeeds(&self, service: &str, command: &[&str]) -> bool {
        let spec = self
            .compose(["exec", "-T", service])
            .args(command.iter().copied())
            .captured();
        match self.runner.run(&spec).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(command = %spec.display(), error = %e, "probe could not run");
                false
            }
        }
    }
}
