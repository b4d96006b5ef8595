use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use backon::{ConstantBuilder, Retryable};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::engine::{CommandRunner, ComposeEngine};
use crate::topology::ServiceName;

/// Upper bound on a single probe, so a hung probe cannot stall the gate.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// What to poll and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessTarget {
    /// A database container in the topology, probed from inside it.
    Colocated {
        service: String,
        user: String,
        database: String,
    },
    /// A database reachable over the network, probed from this host.
    Remote { host: String, port: u16 },
}

impl ReadinessTarget {
    pub fn for_database(db: &DatabaseConfig) -> Self {
        match &db.host {
            Some(host) => ReadinessTarget::Remote {
                host: host.clone(),
                port: db.port,
            },
            None => ReadinessTarget::Colocated {
                service: ServiceName::Database.as_str().to_string(),
                user: db.user.clone(),
                database: db.name.clone(),
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            ReadinessTarget::Colocated { service, .. } => format!("service '{}'", service),
            ReadinessTarget::Remote { host, port } => format!("{}:{}", host, port),
        }
    }
}

/// Bounds of a readiness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(3),
        }
    }
}

/// Fixed-interval, bounded polling of a dependency's availability.
pub struct ReadinessPoller<'a, R> {
    engine: ComposeEngine<'a, R>,
    probe_timeout: Duration,
}

impl<'a, R: CommandRunner> ReadinessPoller<'a, R> {
    pub fn new(runner: &'a R, project_dir: &'a Path) -> Self {
        Self {
            engine: ComposeEngine::new(runner, project_dir),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Probe `target` up to `max_attempts` times, `interval` apart. Returns
    /// false once the attempts are exhausted; never errors.
    pub async fn wait(&self, target: &ReadinessTarget, max_attempts: u32, interval: Duration) -> bool {
        if max_attempts == 0 {
            return false;
        }
        let backoff = ConstantBuilder::default()
            .with_delay(interval)
            .with_max_times(max_attempts as usize - 1);

        let result = (|| async { self.probe(target).await })
            .retry(backoff)
            .notify(|err: &anyhow::Error, dur: Duration| {
                debug!(dependency = %target.describe(), "not ready: {:#}, retrying in {:?}", err, dur);
            })
            .await;

        match result {
            Ok(()) => {
                debug!(dependency = %target.describe(), "ready");
                true
            }
            Err(e) => {
                debug!(dependency = %target.describe(), attempts = max_attempts, "gave up: {:#}", e);
                false
            }
        }
    }

    pub async fn wait_with(&self, target: &ReadinessTarget, policy: PollPolicy) -> bool {
        self.wait(target, policy.max_attempts, policy.interval).await
    }

    async fn probe(&self, target: &ReadinessTarget) -> Result<()> {
        match target {
            ReadinessTarget::Colocated {
                service,
                user,
                database,
            } => {
                let command = ["pg_isready", "-U", user.as_str(), "-d", database.as_str()];
                let probe = self.engine.exec_succeeds(service, &command);
                match tokio::time::timeout(self.probe_timeout, probe).await {
                    Ok(true) => Ok(()),
                    Ok(false) => bail!("pg_isready reported not ready"),
                    Err(_) => bail!("pg_isready timed out after {:?}", self.probe_timeout),
                }
            }
            ReadinessTarget::Remote { host, port } => {
                tokio::time::timeout(
                    self.probe_timeout,
                    tokio::net::TcpStream::connect((host.as_str(), *port)),
                )
                .await
                .context("TCP connect timed out")?
                .context("TCP connect failed")?;
                Ok(())
            }
        }
    }
}
