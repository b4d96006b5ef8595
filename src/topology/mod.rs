pub mod builder;
pub mod descriptor;
pub mod discover;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use builder::{build, unmet_dependencies, IndirectionPolicy};
pub use descriptor::TopologyDescriptor;

/// The fixed vocabulary of deployable services.
///
/// Ordering follows startup order, so iterating a selection yields the
/// database first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceName {
    Database,
    Worker,
    Backend,
    Frontend,
    Proxy,
}

impl ServiceName {
    pub const ALL: [ServiceName; 5] = [
        ServiceName::Database,
        ServiceName::Worker,
        ServiceName::Backend,
        ServiceName::Frontend,
        ServiceName::Proxy,
    ];

    /// Key of the service in the topology descriptor.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Database => "postgres",
            ServiceName::Worker => "worker",
            ServiceName::Backend => "backend",
            ServiceName::Frontend => "frontend",
            ServiceName::Proxy => "nginx",
        }
    }

    /// Services this one should run alongside. Missing ones produce a
    /// warning, never an error.
    pub fn soft_dependencies(self) -> &'static [ServiceName] {
        match self {
            ServiceName::Frontend => &[ServiceName::Backend],
            _ => &[],
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceName::ALL
            .into_iter()
            .find(|name| name.as_str() == s.trim())
            .ok_or_else(|| anyhow::anyhow!("unknown service '{}'", s.trim()))
    }
}

/// The operator-chosen subset of services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSelection(BTreeSet<ServiceName>);

impl ServiceSelection {
    pub fn all() -> Self {
        ServiceName::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, name: ServiceName) {
        self.0.insert(name);
    }

    pub fn contains(&self, name: ServiceName) -> bool {
        self.0.contains(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ServiceName> + '_ {
        self.0.iter().copied()
    }

    /// The database is bundled into the topology.
    pub fn has_local_database(&self) -> bool {
        self.contains(ServiceName::Database)
    }

    /// Some selected service stores data in the database.
    pub fn needs_database(&self) -> bool {
        self.has_local_database()
            || self.contains(ServiceName::Worker)
            || self.contains(ServiceName::Backend)
    }

    /// Database consumers are selected but the database itself is not, so it
    /// must be hosted elsewhere.
    pub fn needs_remote_database(&self) -> bool {
        self.needs_database() && !self.has_local_database()
    }
}

impl FromIterator<ServiceName> for ServiceSelection {
    fn from_iter<I: IntoIterator<Item = ServiceName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ServiceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ServiceName::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// A predefined installation profile. `services: None` means the operator
/// picks services one by one.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub label: &'static str,
    pub services: Option<&'static [ServiceName]>,
}

pub const PROFILES: &[Profile] = &[
    Profile {
        label: "Full (all services)",
        services: Some(&ServiceName::ALL),
    },
    Profile {
        label: "Worker only",
        services: Some(&[ServiceName::Worker]),
    },
    Profile {
        label: "DB only",
        services: Some(&[ServiceName::Database]),
    },
    Profile {
        label: "Everything without worker",
        services: Some(&[
            ServiceName::Database,
            ServiceName::Backend,
            ServiceName::Frontend,
            ServiceName::Proxy,
        ]),
    },
    Profile {
        label: "Custom",
        services: None,
    },
];
