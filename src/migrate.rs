use tracing::{debug, warn};

use crate::engine::{run_checked, CommandRunner, CommandSpec, Git};
use crate::error::DeployError;
use crate::project::ProjectLayout;
use crate::ui::output;

const DIESEL_VERSION: &str = "v2.3.5";

/// What `apply` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    /// The project has no schema directory.
    Skipped,
}

/// Installer command for the diesel CLI on this platform.
pub fn diesel_install_command() -> String {
    let base = format!("https://github.com/diesel-rs/diesel/releases/download/{DIESEL_VERSION}");
    if cfg!(windows) {
        format!("irm {base}/diesel_cli-installer.ps1 | iex")
    } else {
        format!("curl --proto '=https' --tlsv1.2 -LsSf {base}/diesel_cli-installer.sh | sh")
    }
}

/// The command an operator can run by hand when the automatic run is skipped.
pub fn manual_migration_command(url: &str) -> String {
    format!(
        "cd {} && DATABASE_URL='{}' diesel migration run",
        crate::project::SCHEMA_DIR_NAME,
        url
    )
}

/// Applies pending schema migrations with the diesel CLI.
pub struct MigrationRunner<'a, R> {
    runner: &'a R,
    layout: &'a ProjectLayout,
}

impl<'a, R: CommandRunner> MigrationRunner<'a, R> {
    pub fn new(runner: &'a R, layout: &'a ProjectLayout) -> Self {
        Self { runner, layout }
    }

    /// Sync the schema sources and apply pending migrations against `url`,
    /// which must be reachable from this host.
    pub async fn apply(&self, url: &str) -> Result<MigrationOutcome, DeployError> {
        output::header("MIGRATIONS");
        let schema_dir = self.layout.schema_dir();
        if !schema_dir.is_dir() {
            warn!(path = %schema_dir.display(), "schema directory missing, skipping migrations");
            output::warn(&format!(
                "'{}' not found, skipping migrations.",
                crate::project::SCHEMA_DIR_NAME
            ));
            return Ok(MigrationOutcome::Skipped);
        }

        self.check_tool().await?;
        self.sync_sources().await?;

        let spec = CommandSpec::new("diesel")
            .args(["migration", "run"])
            .current_dir(&schema_dir)
            .env("DATABASE_URL", url);
        run_checked(self.runner, &spec).await?;
        output::success("Migrations applied.");
        Ok(MigrationOutcome::Applied)
    }

    async fn check_tool(&self) -> Result<(), DeployError> {
        let spec = CommandSpec::new("diesel").arg("--version").captured();
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => {
                debug!(version = %out.stdout.trim(), "diesel detected");
                Ok(())
            }
            _ => Err(DeployError::MissingPrerequisite {
                tool: "diesel CLI".to_string(),
                remedy: format!(
                    "Install it with:\n  {}\nthen re-run.",
                    diesel_install_command()
                ),
            }),
        }
    }

    /// Pull the latest migrations. The generated schema-reflection file is
    /// rewritten by every migration run, so local changes to it are dropped
    /// before pulling.
    async fn sync_sources(&self) -> Result<(), DeployError> {
        let git = Git::new(self.runner, self.layout.root());
        if !git.is_repository().await {
            warn!(path = %self.layout.root().display(), "not a git working copy, using local migrations");
            output::warn("Not a git repository, skipping migration sync.");
            return Ok(());
        }

        let reflection = self.layout.schema_reflection_file();
        let reflection = reflection.to_string_lossy();
        if git.is_dirty(&reflection).await? {
            output::info(&format!("Discarding regenerated {}", reflection));
            git.discard(&reflection).await?;
        }
        git.pull().await
    }
}
