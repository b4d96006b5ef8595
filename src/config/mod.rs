pub mod fields;
pub mod model;
pub mod secrets;
pub mod store;

pub use model::{inject_database_url, AppConfig, DatabaseConfig, WorkerConfig};
pub use store::{Settings, SettingsStore};
