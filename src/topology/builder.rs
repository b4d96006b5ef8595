use tracing::warn;

use super::descriptor::{
    BuildSpec, DependencyCondition, Healthcheck, NetworkDefinition, ServiceDefinition,
    TopologyDescriptor, VolumeDefinition,
};
use super::{ServiceName, ServiceSelection};
use crate::config::model::{keys, DB_INTERNAL_ALIAS, DEFAULT_DB_PORT};
use crate::config::AppConfig;

pub const APP_NETWORK: &str = "app-network";
pub const DATABASE_VOLUME: &str = "postgres-data";
const RESTART_POLICY: &str = "unless-stopped";

const WORKER_IMAGE: &str = "ghcr.io/kauri-off/mine_search/worker:latest";
const BACKEND_IMAGE: &str = "ghcr.io/kauri-off/mine_search/backend:latest";
const DATABASE_IMAGE: &str = "postgres";
const PROXY_IMAGE: &str = "nginx:alpine";
const PROXY_CONTAINER: &str = "nginx-proxy";

const WORKER_ENV: &[&str] = &[
    keys::THREADS,
    keys::DATABASE_URL,
    keys::SEARCH_MODULE,
    keys::UPDATE_MODULE,
    keys::UPDATE_WITH_CONNECTION,
    keys::UPDATE_ONLY_SPOOFABLE,
    keys::UPDATE_ONLY_CRACKED,
    keys::RUST_LOG,
];

const BACKEND_ENV: &[&str] = &[
    keys::DATABASE_URL,
    keys::BACKEND_PASSWORD,
    keys::BACKEND_SECRET,
];

/// How configuration values appear in the descriptor.
#[derive(Debug, Clone, Copy)]
pub enum IndirectionPolicy<'a> {
    /// `${KEY}` placeholders, resolved by the engine from the settings store
    /// at launch. The descriptor never contains a credential.
    Referenced,
    /// Resolved values embedded at build time. Rotating a secret then
    /// requires regenerating the descriptor; no workflow uses this.
    Baked(&'a AppConfig),
}

impl IndirectionPolicy<'_> {
    /// Value bound to a settings key, for the service environment.
    fn binding(&self, key: &str) -> String {
        match self {
            IndirectionPolicy::Referenced => format!("${{{key}}}"),
            IndirectionPolicy::Baked(cfg) if key == keys::DATABASE_URL => {
                cfg.database.service_url()
            }
            IndirectionPolicy::Baked(cfg) => cfg.field_value(key).unwrap_or_default(),
        }
    }

    /// Value for a healthcheck run inside the container, where `$$KEY`
    /// reads the container's own environment.
    fn container_binding(&self, key: &str) -> String {
        match self {
            IndirectionPolicy::Referenced => format!("$${{{key}}}"),
            IndirectionPolicy::Baked(_) => self.binding(key),
        }
    }

    fn database_port(&self) -> String {
        match self {
            IndirectionPolicy::Referenced => {
                format!("${{{}:-{}}}", keys::POSTGRES_PORT, DEFAULT_DB_PORT)
            }
            IndirectionPolicy::Baked(cfg) => cfg.database.port.to_string(),
        }
    }
}

/// Soft dependencies the selection leaves unmet, as (service, missing) pairs.
pub fn unmet_dependencies(services: &ServiceSelection) -> Vec<(ServiceName, ServiceName)> {
    services
        .iter()
        .flat_map(move |svc| {
            svc.soft_dependencies()
                .iter()
                .filter(move |dep| !services.contains(**dep))
                .map(move |dep| (svc, *dep))
        })
        .collect()
}

/// Build the topology descriptor for a service selection.
///
/// Deterministic for a given input. Under the referenced policy the output
/// does not depend on any configuration value.
pub fn build(services: &ServiceSelection, policy: &IndirectionPolicy<'_>) -> TopologyDescriptor {
    for (svc, missing) in unmet_dependencies(services) {
        warn!("{svc} depends on {missing}, but {missing} is not selected");
    }

    let mut descriptor = TopologyDescriptor::default();
    descriptor
        .networks
        .insert(APP_NETWORK.to_string(), NetworkDefinition::default());

    for svc in services.iter() {
        let definition = match svc {
            ServiceName::Database => database_service(policy),
            ServiceName::Worker => {
                database_consumer(WORKER_IMAGE, WORKER_ENV, services, policy)
            }
            ServiceName::Backend => {
                database_consumer(BACKEND_IMAGE, BACKEND_ENV, services, policy)
            }
            ServiceName::Frontend => frontend_service(services),
            ServiceName::Proxy => proxy_service(services),
        };
        descriptor.services.insert(svc.as_str().to_string(), definition);
    }

    if services.has_local_database() {
        descriptor
            .volumes
            .insert(DATABASE_VOLUME.to_string(), VolumeDefinition::default());
    }

    descriptor
}

fn base_service() -> ServiceDefinition {
    ServiceDefinition {
        networks: vec![APP_NETWORK.to_string()],
        restart: Some(RESTART_POLICY.to_string()),
        ..Default::default()
    }
}

fn database_service(policy: &IndirectionPolicy<'_>) -> ServiceDefinition {
    let port = policy.database_port();
    let mut svc = base_service();
    svc.image = Some(DATABASE_IMAGE.to_string());
    svc.container_name = Some(DB_INTERNAL_ALIAS.to_string());
    for key in [keys::POSTGRES_USER, keys::POSTGRES_PASSWORD, keys::POSTGRES_DB] {
        svc.environment.insert(key.to_string(), policy.binding(key));
    }
    // The server and pg_isready both honour PGPORT
    svc.environment.insert("PGPORT".to_string(), port.clone());
    svc.healthcheck = Some(Healthcheck {
        test: vec![
            "CMD-SHELL".to_string(),
            format!(
                "pg_isready -U {} -d {}",
                policy.container_binding(keys::POSTGRES_USER),
                policy.container_binding(keys::POSTGRES_DB)
            ),
        ],
        interval: "5s".to_string(),
        timeout: "5s".to_string(),
        retries: 5,
    });
    svc.volumes = vec![format!("{DATABASE_VOLUME}:/var/lib/postgresql")];
    svc.ports = vec![format!("127.0.0.1:{port}:{port}/tcp")];
    svc
}

fn database_consumer(
    image: &str,
    env_keys: &[&str],
    services: &ServiceSelection,
    policy: &IndirectionPolicy<'_>,
) -> ServiceDefinition {
    let mut svc = base_service();
    svc.image = Some(image.to_string());
    for key in env_keys {
        svc.environment.insert(key.to_string(), policy.binding(key));
    }
    if services.has_local_database() {
        svc.depends_on(
            ServiceName::Database.as_str(),
            DependencyCondition::ServiceHealthy,
        );
    }
    svc
}

fn frontend_service(services: &ServiceSelection) -> ServiceDefinition {
    let mut svc = base_service();
    svc.build = Some(BuildSpec {
        context: ".".to_string(),
        dockerfile: "frontend.Dockerfile".to_string(),
    });
    started_after(&mut svc, services, &[ServiceName::Backend]);
    svc
}

fn proxy_service(services: &ServiceSelection) -> ServiceDefinition {
    let mut svc = base_service();
    svc.image = Some(PROXY_IMAGE.to_string());
    svc.container_name = Some(PROXY_CONTAINER.to_string());
    svc.volumes = vec!["./nginx.conf:/etc/nginx/conf.d/default.conf:ro".to_string()];
    svc.ports = vec!["8080:80".to_string()];
    started_after(
        &mut svc,
        services,
        &[ServiceName::Backend, ServiceName::Frontend],
    );
    svc
}

/// Order after the selected members of `deps`; unselected ones are left out
/// so the descriptor never names a missing service.
fn started_after(svc: &mut ServiceDefinition, services: &ServiceSelection, deps: &[ServiceName]) {
    for dep in deps.iter().filter(|d| services.contains(**d)) {
        svc.depends_on(dep.as_str(), DependencyCondition::ServiceStarted);
    }
}
