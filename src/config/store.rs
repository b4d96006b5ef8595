use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::debug;

/// Flat key-value settings in file order.
pub type Settings = IndexMap<String, String>;

/// The persisted `KEY=VALUE` settings file.
///
/// No caching: every `load` reads the file again so edits made by the
/// operator between steps are always seen.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings. A missing file yields an empty map.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "settings file not found, starting empty");
            return Ok(Settings::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading settings file {}", self.path.display()))?;
        let settings = parse_settings(&content);
        debug!(path = %self.path.display(), keys = settings.len(), "loaded settings");
        Ok(settings)
    }

    /// Replace the file with `settings`, one `KEY=VALUE` per line.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let content = render_settings(settings);
        // Write the full content to a sibling file then rename over the target
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing settings file {}", self.path.display()))?;
        debug!(path = %self.path.display(), keys = settings.len(), "saved settings");
        Ok(())
    }
}

/// Parse settings text. Blank lines, `#` comments and lines without `=` are
/// skipped; the first `=` separates key from value. A repeated key keeps its
/// last value.
pub fn parse_settings(content: &str) -> Settings {
    let mut settings = Settings::new();
    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            debug!(line = line_num + 1, "skipping settings line without '='");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            debug!(line = line_num + 1, "skipping settings line with empty key");
            continue;
        }
        settings.insert(key.to_string(), value.trim().to_string());
    }
    settings
}

pub fn render_settings(settings: &Settings) -> String {
    let mut out = String::new();
    for (key, value) in settings {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}
