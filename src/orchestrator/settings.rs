use anyhow::Result;
use tracing::info;

use super::{shown_value, Deployer};
use crate::config::fields::{Field, FIELDS};
use crate::config::model::{keys, parse_port};
use crate::config::{inject_database_url, DatabaseConfig, Settings};
use crate::engine::{CommandRunner, UpOptions};
use crate::topology::discover::installed_selection;
use crate::topology::{build, IndirectionPolicy};
use crate::ui::{output, Answer, Prompter};

impl<R: CommandRunner, P: Prompter> Deployer<R, P> {
    /// Edit stored settings in place. Nothing is written unless a value
    /// changed, and the descriptor is only rebuilt when the operator asks.
    pub async fn change_settings(&self) -> Result<()> {
        output::header("CHANGE SETTINGS");
        let store = self.store();
        let original = store.load()?;
        if original.is_empty() {
            output::warn(".env not found or empty; starting from scratch.");
        }
        output::info("Press Enter to keep the current value, '-' to clear it.");

        let mut raw = original.clone();
        for field in FIELDS {
            self.edit_field(field, &mut raw)?;
        }

        if raw == original {
            output::info("No changes made.");
            return Ok(());
        }

        if DatabaseConfig::is_configured(&raw) {
            if !DatabaseConfig::has_credentials(&raw) {
                output::warn("Database credentials are incomplete; DATABASE_URL removed.");
            }
            inject_database_url(&mut raw);
        }
        store.save(&raw)?;
        info!(path = %store.path().display(), "settings updated");
        output::success("Settings saved.");
        output::print_settings_summary(&raw);

        let compose_file = self.layout.compose_file();
        if compose_file.exists()
            && self
                .prompter
                .confirm("Regenerate docker-compose.yml? Manual edits to it will be lost.", false)?
        {
            let installed = installed_selection(&compose_file);
            if installed.is_empty() {
                output::warn("docker-compose.yml lists no known services; left untouched.");
            } else if build(&installed, &IndirectionPolicy::Referenced).save(&compose_file)? {
                output::success("docker-compose.yml regenerated.");
            } else {
                output::info("docker-compose.yml already up to date.");
            }
        }

        if self
            .prompter
            .confirm("Restart services to apply the new settings?", true)?
        {
            let engine = self.engine();
            engine.check_installed().await?;
            engine.up(UpOptions::default()).await?;
            output::success("Services restarted with the new settings.");
        }
        Ok(())
    }

    fn edit_field(&self, field: &Field, raw: &mut Settings) -> Result<()> {
        loop {
            let shown = shown_value(field, raw.get(field.key).map(String::as_str));
            match self.prompter.ask(field.label, shown.as_deref())? {
                Answer::Keep => return Ok(()),
                Answer::Clear => {
                    raw.shift_remove(field.key);
                    return Ok(());
                }
                Answer::Set(value) => {
                    if field.key == keys::POSTGRES_PORT {
                        if let Err(e) = parse_port(&value) {
                            output::warn(&format!("{:#}", e));
                            continue;
                        }
                    }
                    raw.insert(field.key.to_string(), value);
                    return Ok(());
                }
            }
        }
    }
}
