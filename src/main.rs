use clap::Parser;
use stackup::cli::Cli;
use stackup::engine::SystemRunner;
use stackup::error::DeployError;
use stackup::orchestrator::{Deployer, Workflow};
use stackup::project::ProjectLayout;
use stackup::ui::{output, Prompter, TerminalPrompter};

const MENU: &[&str] = &[
    "Install  - fresh setup, choose which services to deploy",
    "Update   - pull images, run migrations, start or stop services",
    "Settings - change .env values and restart",
    "Exit",
];

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; the interactive transcript owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let code = match e.downcast::<DeployError>() {
            Ok(err) => {
                let code = err.exit_code();
                eprintln!("{:?}", miette::Report::new(err));
                code
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = ProjectLayout::resolve(cli.global.dir.as_deref())?;
    let prompter = TerminalPrompter;

    let workflow = match cli.mode {
        Some(mode) => Workflow::from(mode),
        None => {
            output::header("stackup");
            match prompter.choose("Select mode:", MENU)? {
                0 => Workflow::Install,
                1 => Workflow::Update,
                2 => Workflow::Settings,
                _ => {
                    println!("  Bye!");
                    return Ok(());
                }
            }
        }
    };

    Deployer::new(layout, SystemRunner, prompter)
        .with_poll_policy(cli.global.poll_policy())
        .run(workflow)
        .await
}
