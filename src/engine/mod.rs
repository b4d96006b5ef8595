pub mod compose;
pub mod git;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::DeployError;
use crate::ui::output;

pub use compose::{ComposeEngine, UpOptions};
pub use git::Git;

/// One child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Overrides applied to the child only; the current process environment
    /// is never modified.
    pub env: Vec<(String, String)>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// The command line as the operator would type it.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished child process. `stdout`/`stderr` are empty unless
/// the command was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs child processes. Workflows only talk to external tools through this
/// seam.
pub trait CommandRunner {
    /// Run `spec` to completion. Errors only when the process could not be
    /// started; a non-zero exit is reported through `CommandOutput::code`.
    fn run(&self, spec: &CommandSpec) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}

/// Runs commands on the host via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        debug!(command = %spec.display(), cwd = ?spec.cwd, capture = spec.capture, "running command");

        if spec.capture {
            let output = cmd.output().await?;
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd.status().await?;
            Ok(CommandOutput {
                code: status.code(),
                ..Default::default()
            })
        }
    }
}

/// Run a command that must succeed. Streamed commands are echoed first;
/// a failure carries the exact command line and exit status.
pub async fn run_checked<R: CommandRunner>(
    runner: &R,
    spec: &CommandSpec,
) -> Result<CommandOutput, DeployError> {
    if !spec.capture {
        output::command_line(&spec.display());
    }
    let result = runner
        .run(spec)
        .await
        .map_err(|source| DeployError::CommandSpawn {
            command: spec.display(),
            source,
        })?;
    if !result.success() {
        if !result.stderr.trim().is_empty() {
            eprintln!("{}", result.stderr.trim_end());
        }
        return Err(DeployError::CommandFailed {
            command: spec.display(),
            code: result.code,
        });
    }
    Ok(result)
}
