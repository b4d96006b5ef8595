pub mod install;
pub mod settings;
pub mod update;

use anyhow::Result;

use crate::config::fields::Field;
use crate::config::model::DEFAULT_PASSWORD;
use crate::config::{DatabaseConfig, SettingsStore};
use crate::engine::{CommandRunner, ComposeEngine};
use crate::migrate::{manual_migration_command, MigrationOutcome, MigrationRunner};
use crate::project::ProjectLayout;
use crate::ready::{PollPolicy, ReadinessPoller, ReadinessTarget};
use crate::ui::{output, Prompter};

pub use update::UpdateAction;

/// Shown instead of a secret's current value.
const MASK: &str = "****";

/// The three operator workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Install,
    Update,
    Settings,
}

/// Runs the deployment workflows for one project directory.
///
/// Every step re-reads the settings file and descriptor from disk rather
/// than trusting an earlier copy, since the operator may edit either
/// between runs.
pub struct Deployer<R, P> {
    layout: ProjectLayout,
    runner: R,
    prompter: P,
    poll: PollPolicy,
}

impl<R: CommandRunner, P: Prompter> Deployer<R, P> {
    pub fn new(layout: ProjectLayout, runner: R, prompter: P) -> Self {
        Self {
            layout,
            runner,
            prompter,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub async fn run(&self, workflow: Workflow) -> Result<()> {
        match workflow {
            Workflow::Install => self.install().await,
            Workflow::Update => self.update().await,
            Workflow::Settings => self.change_settings().await,
        }
    }

    fn store(&self) -> SettingsStore {
        SettingsStore::new(self.layout.env_file())
    }

    fn engine(&self) -> ComposeEngine<'_, R> {
        ComposeEngine::new(&self.runner, self.layout.root())
    }

    /// Wait for the database, then apply migrations from this host. A
    /// database that never becomes ready is not fatal: the operator gets the
    /// command to run later.
    async fn migrate_when_ready(&self, db: &DatabaseConfig) -> Result<Option<MigrationOutcome>> {
        let target = ReadinessTarget::for_database(db);
        output::info(&format!(
            "Waiting for the database (up to {} attempts, {:?} apart)...",
            self.poll.max_attempts, self.poll.interval
        ));
        let poller = ReadinessPoller::new(&self.runner, self.layout.root());
        if !poller.wait_with(&target, self.poll).await {
            output::warn("The database did not become ready in time; migrations were not run.");
            output::warn(&format!(
                "Run them manually: {}",
                manual_migration_command(&db.migration_url())
            ));
            return Ok(None);
        }
        output::success("Database is ready.");

        let outcome = MigrationRunner::new(&self.runner, &self.layout)
            .apply(&db.migration_url())
            .await?;
        Ok(Some(outcome))
    }
}

/// How a field's current value is displayed in a prompt.
fn shown_value(field: &Field, current: Option<&str>) -> Option<String> {
    match current {
        Some(value) if field.secret && !value.is_empty() && value != DEFAULT_PASSWORD => {
            Some(MASK.to_string())
        }
        Some(value) => Some(value.to_string()),
        None => None,
    }
}
