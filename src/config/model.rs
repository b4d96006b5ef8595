use anyhow::{bail, Result};
use tracing::warn;

use super::secrets::generate_signing_secret;
use super::store::Settings;
use crate::topology::{ServiceName, ServiceSelection};

/// Keys of the settings store owned by the configuration model.
pub mod keys {
    pub const POSTGRES_USER: &str = "POSTGRES_USER";
    pub const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
    pub const POSTGRES_DB: &str = "POSTGRES_DB";
    pub const POSTGRES_HOST: &str = "POSTGRES_HOST";
    pub const POSTGRES_PORT: &str = "POSTGRES_PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";

    pub const THREADS: &str = "THREADS";
    pub const SEARCH_MODULE: &str = "SEARCH_MODULE";
    pub const UPDATE_MODULE: &str = "UPDATE_MODULE";
    pub const UPDATE_WITH_CONNECTION: &str = "UPDATE_WITH_CONNECTION";
    pub const UPDATE_ONLY_SPOOFABLE: &str = "UPDATE_ONLY_SPOOFABLE";
    pub const UPDATE_ONLY_CRACKED: &str = "UPDATE_ONLY_CRACKED";
    pub const RUST_LOG: &str = "RUST_LOG";

    pub const BACKEND_PASSWORD: &str = "BACKEND_PASSWORD";
    pub const BACKEND_SECRET: &str = "BACKEND_SECRET";
}

/// Network alias of the co-located database inside the topology.
pub const DB_INTERNAL_ALIAS: &str = "postgres-container";
/// Address the orchestrating host uses to reach a co-located database.
pub const LOOPBACK_ADDR: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 5432;

const DEFAULT_DB_USER: &str = "user";
/// First-run placeholder for passwords the operator is expected to replace.
pub const DEFAULT_PASSWORD: &str = "CHANGE_THIS";
const DEFAULT_DB_NAME: &str = "mine_search_db";

fn stored_or(raw: &Settings, key: &str, default: &str) -> String {
    raw.get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Parse a port entered by the operator or found in the store.
pub fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => bail!("'{}' is not a valid port (1-65535)", value.trim()),
        Ok(port) => Ok(port),
    }
}

/// Connection settings for the relational database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub name: String,
    /// Set only for an externally hosted database; never an empty string.
    pub host: Option<String>,
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            name: DEFAULT_DB_NAME.to_string(),
            host: None,
            port: DEFAULT_DB_PORT,
        }
    }
}

impl DatabaseConfig {
    pub fn from_store(raw: &Settings) -> Self {
        let port = match raw.get(keys::POSTGRES_PORT) {
            Some(value) => parse_port(value).unwrap_or_else(|e| {
                warn!("ignoring stored {}: {}", keys::POSTGRES_PORT, e);
                DEFAULT_DB_PORT
            }),
            None => DEFAULT_DB_PORT,
        };
        let mut config = Self {
            user: stored_or(raw, keys::POSTGRES_USER, DEFAULT_DB_USER),
            password: stored_or(raw, keys::POSTGRES_PASSWORD, DEFAULT_PASSWORD),
            name: stored_or(raw, keys::POSTGRES_DB, DEFAULT_DB_NAME),
            host: None,
            port,
        };
        config.set_host(raw.get(keys::POSTGRES_HOST).cloned());
        config
    }

    /// True when any database connection key has ever been stored.
    pub fn is_configured(raw: &Settings) -> bool {
        [
            keys::POSTGRES_USER,
            keys::POSTGRES_PASSWORD,
            keys::POSTGRES_DB,
            keys::POSTGRES_HOST,
        ]
        .iter()
        .any(|key| raw.contains_key(*key))
    }

    /// True when user, password and database name are all stored.
    pub fn has_credentials(raw: &Settings) -> bool {
        [keys::POSTGRES_USER, keys::POSTGRES_PASSWORD, keys::POSTGRES_DB]
            .iter()
            .all(|key| raw.contains_key(*key))
    }

    /// Set the remote host; blank input means the database is co-located.
    pub fn set_host(&mut self, host: Option<String>) {
        self.host = host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
    }

    pub fn is_remote(&self) -> bool {
        self.host.is_some()
    }

    fn url_with_host(&self, host: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, host, self.port, self.name
        )
    }

    /// URL resolvable from inside the topology network.
    pub fn service_url(&self) -> String {
        match &self.host {
            Some(host) => self.url_with_host(host),
            None => self.url_with_host(DB_INTERNAL_ALIAS),
        }
    }

    /// URL resolvable from the orchestrating host, used for migrations.
    pub fn migration_url(&self) -> String {
        match &self.host {
            Some(host) => self.url_with_host(host),
            None => self.url_with_host(LOOPBACK_ADDR),
        }
    }

    fn write_to(&self, raw: &mut Settings) {
        raw.insert(keys::POSTGRES_USER.to_string(), self.user.clone());
        raw.insert(keys::POSTGRES_PASSWORD.to_string(), self.password.clone());
        raw.insert(keys::POSTGRES_DB.to_string(), self.name.clone());
        match &self.host {
            Some(host) => {
                raw.insert(keys::POSTGRES_HOST.to_string(), host.clone());
            }
            None => {
                raw.shift_remove(keys::POSTGRES_HOST);
            }
        }
        raw.insert(keys::POSTGRES_PORT.to_string(), self.port.to_string());
    }
}

/// Worker tuning. Every value is forwarded to the worker untouched; the
/// worker owns their meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub threads: String,
    pub search_module: String,
    pub update_module: String,
    pub update_with_connection: String,
    pub update_only_spoofable: String,
    pub update_only_cracked: String,
    pub log_level: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: "500".to_string(),
            search_module: "true".to_string(),
            update_module: "true".to_string(),
            update_with_connection: "false".to_string(),
            update_only_spoofable: "false".to_string(),
            update_only_cracked: "false".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_store(raw: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            threads: stored_or(raw, keys::THREADS, &defaults.threads),
            search_module: stored_or(raw, keys::SEARCH_MODULE, &defaults.search_module),
            update_module: stored_or(raw, keys::UPDATE_MODULE, &defaults.update_module),
            update_with_connection: stored_or(
                raw,
                keys::UPDATE_WITH_CONNECTION,
                &defaults.update_with_connection,
            ),
            update_only_spoofable: stored_or(
                raw,
                keys::UPDATE_ONLY_SPOOFABLE,
                &defaults.update_only_spoofable,
            ),
            update_only_cracked: stored_or(
                raw,
                keys::UPDATE_ONLY_CRACKED,
                &defaults.update_only_cracked,
            ),
            log_level: stored_or(raw, keys::RUST_LOG, &defaults.log_level),
        }
    }

    fn entries(&self) -> [(&'static str, &String); 7] {
        [
            (keys::THREADS, &self.threads),
            (keys::SEARCH_MODULE, &self.search_module),
            (keys::UPDATE_MODULE, &self.update_module),
            (keys::UPDATE_WITH_CONNECTION, &self.update_with_connection),
            (keys::UPDATE_ONLY_SPOOFABLE, &self.update_only_spoofable),
            (keys::UPDATE_ONLY_CRACKED, &self.update_only_cracked),
            (keys::RUST_LOG, &self.log_level),
        ]
    }

    fn write_to(&self, raw: &mut Settings) {
        for (key, value) in self.entries() {
            raw.insert(key.to_string(), value.clone());
        }
    }
}

/// The complete deployment configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub worker: WorkerConfig,
    pub backend_password: String,
    pub signing_secret: String,
    pub services: ServiceSelection,
    secret_generated: bool,
}

impl AppConfig {
    /// Build the configuration from stored values, falling back to defaults
    /// only for keys never stored. A signing secret is generated when the
    /// store has none.
    pub fn from_store(raw: &Settings) -> Self {
        let (signing_secret, secret_generated) = match raw.get(keys::BACKEND_SECRET) {
            Some(secret) if !secret.is_empty() => (secret.clone(), false),
            _ => (generate_signing_secret(), true),
        };
        Self {
            database: DatabaseConfig::from_store(raw),
            worker: WorkerConfig::from_store(raw),
            backend_password: stored_or(raw, keys::BACKEND_PASSWORD, DEFAULT_PASSWORD),
            signing_secret,
            services: ServiceSelection::default(),
            secret_generated,
        }
    }

    pub fn with_services(mut self, services: ServiceSelection) -> Self {
        self.services = services;
        self
    }

    /// Whether `from_store` had to create a new signing secret.
    pub fn secret_generated(&self) -> bool {
        self.secret_generated
    }

    /// Serialize onto `base`, keeping every key this model does not own.
    ///
    /// Only the sections the selected services use are written, so settings
    /// of services outside the selection keep their stored state (including
    /// absence). The signing secret is always written.
    pub fn to_store(&self, base: &Settings) -> Settings {
        let mut raw = base.clone();
        if self.services.needs_database() {
            self.database.write_to(&mut raw);
        }
        if self.services.contains(ServiceName::Backend) {
            raw.insert(
                keys::BACKEND_PASSWORD.to_string(),
                self.backend_password.clone(),
            );
        }
        if self.services.contains(ServiceName::Worker) {
            self.worker.write_to(&mut raw);
        }
        raw.insert(keys::BACKEND_SECRET.to_string(), self.signing_secret.clone());
        raw
    }

    /// Current value of a prompted field, as the operator sees it.
    pub fn field_value(&self, key: &str) -> Option<String> {
        let value = match key {
            keys::POSTGRES_USER => self.database.user.clone(),
            keys::POSTGRES_PASSWORD => self.database.password.clone(),
            keys::POSTGRES_DB => self.database.name.clone(),
            keys::POSTGRES_HOST => return self.database.host.clone(),
            keys::POSTGRES_PORT => self.database.port.to_string(),
            keys::BACKEND_PASSWORD => self.backend_password.clone(),
            keys::BACKEND_SECRET => self.signing_secret.clone(),
            _ => {
                return self
                    .worker
                    .entries()
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (*v).clone())
            }
        };
        Some(value)
    }

    /// Apply an operator-supplied value, rejecting values the model cannot
    /// hold (such as a non-numeric port).
    pub fn set_field(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            keys::POSTGRES_USER => self.database.user = value,
            keys::POSTGRES_PASSWORD => self.database.password = value,
            keys::POSTGRES_DB => self.database.name = value,
            keys::POSTGRES_HOST => self.database.set_host(Some(value)),
            keys::POSTGRES_PORT => self.database.port = parse_port(&value)?,
            keys::BACKEND_PASSWORD => self.backend_password = value,
            keys::BACKEND_SECRET => self.signing_secret = value,
            keys::THREADS => self.worker.threads = value,
            keys::SEARCH_MODULE => self.worker.search_module = value,
            keys::UPDATE_MODULE => self.worker.update_module = value,
            keys::UPDATE_WITH_CONNECTION => self.worker.update_with_connection = value,
            keys::UPDATE_ONLY_SPOOFABLE => self.worker.update_only_spoofable = value,
            keys::UPDATE_ONLY_CRACKED => self.worker.update_only_cracked = value,
            keys::RUST_LOG => self.worker.log_level = value,
            other => bail!("unknown setting '{}'", other),
        }
        Ok(())
    }
}

/// Recompute the injected connection URL from the database keys in `raw`.
/// When a credential is missing the URL is dropped rather than derived from
/// first-run defaults. Returns true when the stored value changed.
pub fn inject_database_url(raw: &mut Settings) -> bool {
    if !DatabaseConfig::has_credentials(raw) {
        return raw.shift_remove(keys::DATABASE_URL).is_some();
    }
    let url = DatabaseConfig::from_store(raw).service_url();
    if raw.get(keys::DATABASE_URL) == Some(&url) {
        return false;
    }
    raw.insert(keys::DATABASE_URL.to_string(), url);
    true
}
