use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::Workflow;
use crate::ready::PollPolicy;

#[derive(Debug, Parser)]
#[command(
    name = "stackup",
    version,
    about = "Configure and deploy the application stack with Docker Compose"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Workflow to run; opens a menu when omitted
    #[arg(value_enum, ignore_case = true)]
    pub mode: Option<Mode>,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Project directory holding .env, docker-compose.yml and db_schema/
    #[arg(short = 'C', long = "dir", env = "STACKUP_DIR")]
    pub dir: Option<PathBuf>,

    /// Readiness probes before giving up on the database
    #[arg(long, env = "STACKUP_READY_ATTEMPTS", default_value_t = 20)]
    pub ready_attempts: u32,

    /// Seconds between readiness probes
    #[arg(long, env = "STACKUP_READY_INTERVAL", default_value_t = 3)]
    pub ready_interval: u64,
}

impl GlobalOpts {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.ready_attempts,
            interval: Duration::from_secs(self.ready_interval),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Fresh setup: choose services, configure, deploy
    #[value(alias = "i")]
    Install,
    /// Pull images, run migrations, start or stop services
    #[value(alias = "u")]
    Update,
    /// Change stored settings and restart
    #[value(alias = "s")]
    Settings,
}

impl From<Mode> for Workflow {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Install => Workflow::Install,
            Mode::Update => Workflow::Update,
            Mode::Settings => Workflow::Settings,
        }
    }
}
