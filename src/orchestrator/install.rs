use anyhow::Result;
use tracing::{debug, info};

use super::{shown_value, Deployer};
use crate::config::fields::{self, Field};
use crate::config::model::keys;
use crate::config::{inject_database_url, AppConfig};
use crate::engine::{CommandRunner, UpOptions};
use crate::error::DeployError;
use crate::topology::discover::installed_selection;
use crate::topology::{
    build, unmet_dependencies, IndirectionPolicy, ServiceName, ServiceSelection, PROFILES,
};
use crate::ui::{output, Answer, Prompter};

const EXISTING_DESCRIPTOR_OPTIONS: &[&str] = &[
    "Overwrite it with a new service selection",
    "Keep it, update settings and redeploy",
    "Abort",
];

impl<R: CommandRunner, P: Prompter> Deployer<R, P> {
    /// Fresh setup: pick services, collect settings, write the settings file
    /// and descriptor, then bring the stack up with migrations applied.
    pub async fn install(&self) -> Result<()> {
        output::header("INSTALL");
        let engine = self.engine();
        engine.check_installed().await?;
        output::success("Docker and Compose v2 detected.");

        let compose_file = self.layout.compose_file();
        let (services, regenerate) = if compose_file.exists() {
            match self.prompter.choose(
                "docker-compose.yml already exists. What should happen to it?",
                EXISTING_DESCRIPTOR_OPTIONS,
            )? {
                0 => (self.select_services()?, true),
                1 => {
                    let installed = installed_selection(&compose_file);
                    if installed.is_empty() {
                        output::warn("The existing file lists no known services; pick them again.");
                        (self.select_services()?, true)
                    } else {
                        output::info(&format!("Keeping installed services: {}", installed));
                        (installed, false)
                    }
                }
                _ => {
                    output::warn("Install aborted; nothing was changed.");
                    return Ok(());
                }
            }
        } else {
            (self.select_services()?, true)
        };

        for (service, missing) in unmet_dependencies(&services) {
            output::warn(&format!(
                "{} usually runs with {}, which is not selected.",
                service, missing
            ));
        }
        if services.needs_remote_database() {
            output::warn("No local database selected; worker/backend will use a remote one.");
        }

        let store = self.store();
        let stored = store.load()?;
        let mut config = AppConfig::from_store(&stored).with_services(services.clone());
        if services.has_local_database() {
            config.database.set_host(None);
        }
        output::info("Configure settings. Press Enter to keep the value in brackets.");
        self.collect_install_fields(&mut config)?;
        if config.secret_generated() {
            output::info("Generated a new backend signing secret.");
        }

        let mut raw = config.to_store(&stored);
        if services.needs_database() {
            inject_database_url(&mut raw);
        }
        store.save(&raw)?;
        info!(services = %services, "settings saved");
        output::success(&format!("Settings written to {}", store.path().display()));

        if regenerate {
            let descriptor = build(&services, &IndirectionPolicy::Referenced);
            if descriptor.save(&compose_file)? {
                output::success(&format!("Topology written to {}", compose_file.display()));
            } else {
                output::info("docker-compose.yml already up to date.");
            }
        }

        if self.prompter.confirm("Pull the latest images?", true)? {
            engine.pull(None).await?;
        }

        if services.has_local_database() {
            engine
                .up(UpOptions {
                    service: Some(ServiceName::Database.as_str()),
                    remove_orphans: false,
                })
                .await?;
            self.migrate_when_ready(&config.database).await?;
        } else if services.needs_database() {
            if self
                .prompter
                .confirm("Run migrations against the remote database now?", true)?
            {
                self.migrate_when_ready(&config.database).await?;
            } else {
                debug!("remote migrations declined");
            }
        }

        engine.up(UpOptions::default()).await?;
        output::success("Installation complete.");
        output::print_settings_summary(&store.load()?);
        Ok(())
    }

    fn select_services(&self) -> Result<ServiceSelection> {
        let labels: Vec<&str> = PROFILES.iter().map(|p| p.label).collect();
        let profile = &PROFILES[self.prompter.choose("Which services should be installed?", &labels)?];

        let services: ServiceSelection = match profile.services {
            Some(names) => names.iter().copied().collect(),
            None => {
                let mut picked = ServiceSelection::default();
                for name in ServiceName::ALL {
                    if self.prompter.confirm(&format!("Include {}?", name), true)? {
                        picked.insert(name);
                    }
                }
                picked
            }
        };
        if services.is_empty() {
            return Err(DeployError::NoServicesSelected.into());
        }
        output::info(&format!("Selected: {}", services));
        Ok(services)
    }

    /// Prompt for every field the selection uses. Enter keeps the stored (or
    /// first-run default) value; invalid input is asked again.
    fn collect_install_fields(&self, config: &mut AppConfig) -> Result<()> {
        let relevant: Vec<&Field> = fields::install_fields(&config.services).collect();
        for field in relevant {
            loop {
                let current = config.field_value(field.key);
                let shown = shown_value(field, current.as_deref());
                match self.prompter.ask(field.label, shown.as_deref())? {
                    Answer::Keep => {}
                    Answer::Clear => {
                        output::warn(&format!("{} cannot be cleared during install.", field.label));
                        continue;
                    }
                    Answer::Set(value) => {
                        if let Err(e) = config.set_field(field.key, value) {
                            output::warn(&format!("{:#}", e));
                            continue;
                        }
                    }
                }
                if field.key == keys::POSTGRES_HOST && !config.database.is_remote() {
                    output::warn("A remote database host is required when the database is not installed.");
                    continue;
                }
                break;
            }
        }
        Ok(())
    }
}
