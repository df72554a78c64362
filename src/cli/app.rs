use anyhow::{bail, Context, Result};
use clap::Parser;
use mission_launcher::{default_plan, save_plan, AgentRegistry, MissionRunner, StepStatus};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, Command, InitArgs, RunArgs};
use crate::cli::bootstrap::build_stack;
use crate::cli::settings::Settings;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level)?;

    info!("Starting Pilot v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run(args) => run_mission(args).await,
        Command::Init(args) => init_workspace(args),
    }
}

fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run_mission(args: RunArgs) -> Result<()> {
    let settings = Settings::from_env()?;
    let stack = build_stack(&settings, &args.memory).await?;

    let registry = AgentRegistry::load(&args.agents).context("loading agent registry")?;
    let runner = MissionRunner::new(&args.mission, registry, stack.collaborators.clone());

    let outcome = runner.run().await;

    // The session is launched once per process and closed once, regardless
    // of how the mission went.
    if let Err(err) = stack.browser.close().await {
        warn!(error = %err, "browser shutdown reported an error");
    }

    let plan = outcome.context("running mission")?;
    for step in &plan.steps {
        match step.status {
            StepStatus::Completed => info!(agent = %step.agent, "step completed"),
            StepStatus::Unavailable => warn!(agent = %step.agent, "step unavailable"),
            StepStatus::Error => error!(
                agent = %step.agent,
                error = step.error.as_deref().unwrap_or("unknown"),
                "step errored"
            ),
            _ => warn!(agent = %step.agent, status = ?step.status, "step left unfinished"),
        }
    }

    // Mission-level failures live in the journals; the process still exits
    // zero. Only internal errors propagate a non-zero exit.
    Ok(())
}

fn init_workspace(args: InitArgs) -> Result<()> {
    if args.mission.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.mission.display()
        );
    }
    save_plan(&args.mission, &default_plan(&args.goal)).context("writing mission plan")?;
    info!(path = %args.mission.display(), "mission plan written");

    if !args.agents.exists() || args.force {
        let registry = serde_json::json!({
            "WriterAgent": "builtin:writer",
            "PosterAgent": "builtin:poster",
        });
        std::fs::write(&args.agents, serde_json::to_vec_pretty(&registry)?)
            .context("writing agent registry")?;
        info!(path = %args.agents.display(), "agent registry written");
    }
    Ok(())
}
