use std::path::{Path, PathBuf};

pub const ENV_FILE_NAME: &str = ".env";
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
pub const SCHEMA_DIR_NAME: &str = "db_schema";

/// Generated by the migration tool after every run, relative to the schema
/// directory.
pub const SCHEMA_REFLECTION_FILE: &str = "src/schema.rs";

/// Locations of every file the workflows read or write, rooted at the
/// project directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the project directory. An explicit `--dir` must exist; without
    /// one the current working directory is used.
    pub fn resolve(cli_dir: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(dir) = cli_dir {
            if dir.is_dir() {
                return Ok(Self::new(dir.canonicalize()?));
            }
            anyhow::bail!("Project directory not found: {}", dir.display());
        }
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(ENV_FILE_NAME)
    }

    pub fn compose_file(&self) -> PathBuf {
        self.root.join(COMPOSE_FILE_NAME)
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.root.join(SCHEMA_DIR_NAME)
    }

    /// The schema-reflection file as git sees it, relative to the project root.
    pub fn schema_reflection_file(&self) -> PathBuf {
        Path::new(SCHEMA_DIR_NAME).join(SCHEMA_REFLECTION_FILE)
    }
}
