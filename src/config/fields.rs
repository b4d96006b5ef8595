use super::model::keys;
use crate::topology::{ServiceName, ServiceSelection};

/// Which part of the stack a setting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Credentials of the database, used by every database consumer.
    Database,
    /// Location of an externally hosted database.
    RemoteDatabase,
    Backend,
    Worker,
}

/// An operator-editable setting.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub scope: FieldScope,
    /// Masked when displayed.
    pub secret: bool,
}

impl Field {
    const fn new(key: &'static str, label: &'static str, scope: FieldScope) -> Self {
        Self {
            key,
            label,
            scope,
            secret: false,
        }
    }

    const fn secret(key: &'static str, label: &'static str, scope: FieldScope) -> Self {
        Self {
            key,
            label,
            scope,
            secret: true,
        }
    }

    /// Whether install should prompt for this field given the selection.
    pub fn relevant_to(&self, services: &ServiceSelection) -> bool {
        match self.scope {
            FieldScope::Database => services.needs_database(),
            FieldScope::RemoteDatabase => services.needs_remote_database(),
            FieldScope::Backend => services.contains(ServiceName::Backend),
            FieldScope::Worker => services.contains(ServiceName::Worker),
        }
    }
}

/// Every setting the operator can edit, in prompt order.
pub const FIELDS: &[Field] = &[
    Field::new(keys::POSTGRES_USER, "PostgreSQL user", FieldScope::Database),
    Field::secret(
        keys::POSTGRES_PASSWORD,
        "PostgreSQL password",
        FieldScope::Database,
    ),
    Field::new(keys::POSTGRES_DB, "PostgreSQL database name", FieldScope::Database),
    Field::new(
        keys::POSTGRES_HOST,
        "PostgreSQL host (empty for the bundled database)",
        FieldScope::RemoteDatabase,
    ),
    Field::new(keys::POSTGRES_PORT, "PostgreSQL port", FieldScope::RemoteDatabase),
    Field::secret(
        keys::BACKEND_PASSWORD,
        "Backend API password",
        FieldScope::Backend,
    ),
    Field::secret(
        keys::BACKEND_SECRET,
        "Backend signing secret (changing it logs everyone out)",
        FieldScope::Backend,
    ),
    Field::new(keys::THREADS, "Worker threads", FieldScope::Worker),
    Field::new(
        keys::SEARCH_MODULE,
        "Search module enabled (true/false)",
        FieldScope::Worker,
    ),
    Field::new(
        keys::UPDATE_MODULE,
        "Update module enabled (true/false)",
        FieldScope::Worker,
    ),
    Field::new(
        keys::UPDATE_WITH_CONNECTION,
        "Update with connection (true/false)",
        FieldScope::Worker,
    ),
    Field::new(
        keys::UPDATE_ONLY_SPOOFABLE,
        "Update only spoofable servers (true/false)",
        FieldScope::Worker,
    ),
    Field::new(
        keys::UPDATE_ONLY_CRACKED,
        "Update only cracked servers (true/false)",
        FieldScope::Worker,
    ),
    Field::new(keys::RUST_LOG, "Worker log level", FieldScope::Worker),
];

/// Fields install asks about. The signing secret is generated, never asked.
pub fn install_fields(services: &ServiceSelection) -> impl Iterator<Item = &'static Field> + '_ {
    FIELDS
        .iter()
        .filter(move |f| f.key != keys::BACKEND_SECRET && f.relevant_to(services))
}

pub fn find(key: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.key == key)
}
