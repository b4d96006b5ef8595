use anyhow::Result;

use super::Deployer;
use crate::config::DatabaseConfig;
use crate::engine::{CommandRunner, UpOptions};
use crate::topology::discover::{discover_services, installed_selection};
use crate::topology::ServiceName;
use crate::ui::{output, Prompter};

/// One entry of the update menu. Every action is safe to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    PullAll,
    PullOne,
    Migrate,
    StartAll,
    StopAll,
    RebuildFrontend,
    Everything,
}

impl UpdateAction {
    pub const ALL: [UpdateAction; 7] = [
        UpdateAction::PullAll,
        UpdateAction::PullOne,
        UpdateAction::Migrate,
        UpdateAction::StartAll,
        UpdateAction::StopAll,
        UpdateAction::RebuildFrontend,
        UpdateAction::Everything,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UpdateAction::PullAll => "Pull latest images & restart all services",
            UpdateAction::PullOne => "Pull latest image & restart one service",
            UpdateAction::Migrate => "Run migrations",
            UpdateAction::StartAll => "Start all services",
            UpdateAction::StopAll => "Stop all services",
            UpdateAction::RebuildFrontend => "Rebuild frontend image",
            UpdateAction::Everything => "Everything (pull, migrate, rebuild frontend)",
        }
    }
}

/// Closest known service to a mistyped name.
pub fn suggest_service<'a>(input: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = strsim::jaro_winkler(input, candidate);
        if score >= 0.8 && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.map(|(name, _)| name)
}

impl<R: CommandRunner, P: Prompter> Deployer<R, P> {
    /// Maintenance of an installed stack: one menu-selected action.
    pub async fn update(&self) -> Result<()> {
        output::header("UPDATE");
        self.engine().check_installed().await?;

        let labels: Vec<&str> = UpdateAction::ALL.iter().map(|a| a.label()).collect();
        let choice = self.prompter.choose("What would you like to do?", &labels)?;
        self.run_update_action(UpdateAction::ALL[choice]).await
    }

    pub async fn run_update_action(&self, action: UpdateAction) -> Result<()> {
        match action {
            UpdateAction::PullAll => self.pull_and_restart_all().await,
            UpdateAction::PullOne => self.pull_and_restart_one().await,
            UpdateAction::Migrate => self.migrate_installed().await,
            UpdateAction::StartAll => {
                self.engine().up(UpOptions::default()).await?;
                output::success("All services started.");
                Ok(())
            }
            UpdateAction::StopAll => {
                self.engine().down().await?;
                output::success("All services stopped.");
                Ok(())
            }
            UpdateAction::RebuildFrontend => self.rebuild_frontend().await,
            UpdateAction::Everything => {
                self.pull_and_restart_all().await?;
                self.migrate_installed().await?;
                self.rebuild_frontend().await
            }
        }
    }

    async fn pull_and_restart_all(&self) -> Result<()> {
        let engine = self.engine();
        engine.pull(None).await?;
        engine
            .up(UpOptions {
                service: None,
                remove_orphans: true,
            })
            .await?;
        output::success("All services updated.");
        Ok(())
    }

    async fn pull_and_restart_one(&self) -> Result<()> {
        let installed = discover_services(&self.layout.compose_file());
        if installed.is_empty() {
            output::warn("No services found in docker-compose.yml; run install first.");
            return Ok(());
        }

        let label = format!("Service name ({})", installed.join(" / "));
        let service = loop {
            let name = self.prompter.input(&label)?;
            if installed.iter().any(|s| *s == name) {
                break name;
            }
            match suggest_service(&name, &installed) {
                Some(hint) => output::warn(&format!("Unknown service '{}'. Did you mean '{}'?", name, hint)),
                None => output::warn(&format!("Unknown service '{}'.", name)),
            }
        };

        let engine = self.engine();
        engine.pull(Some(&service)).await?;
        engine
            .up(UpOptions {
                service: Some(&service),
                remove_orphans: false,
            })
            .await?;
        output::success(&format!("'{}' updated.", service));
        Ok(())
    }

    /// Migrations against the database the installed topology uses: the
    /// bundled container through its published loopback port, or the
    /// configured remote host.
    async fn migrate_installed(&self) -> Result<()> {
        let raw = self.store().load()?;
        let mut db = DatabaseConfig::from_store(&raw);
        let installed = installed_selection(&self.layout.compose_file());

        if installed.has_local_database() {
            db.set_host(None);
        } else if !db.is_remote() {
            output::warn("No database in docker-compose.yml and no remote POSTGRES_HOST configured; skipping migrations.");
            return Ok(());
        }
        self.migrate_when_ready(&db).await?;
        Ok(())
    }

    async fn rebuild_frontend(&self) -> Result<()> {
        let installed = installed_selection(&self.layout.compose_file());
        if !installed.contains(ServiceName::Frontend) {
            output::warn("The frontend is not part of the installed services; nothing to rebuild.");
            return Ok(());
        }
        let frontend = ServiceName::Frontend.as_str();
        let engine = self.engine();
        engine.build(frontend).await?;
        engine
            .up(UpOptions {
                service: Some(frontend),
                remove_orphans: false,
            })
            .await?;
        output::success("Frontend rebuilt and restarted.");
        Ok(())
    }
}
