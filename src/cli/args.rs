use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pilot", version, about = "Supervised autonomous agent runtime")]
pub struct CliArgs {
    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute the mission plan end to end.
    Run(RunArgs),
    /// Scaffold a default mission plan and agent registry.
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Mission plan file (the step journal).
    #[arg(long, default_value = "missions/mission_001.json")]
    pub mission: PathBuf,

    /// Agent registry file.
    #[arg(long, default_value = "agents_map.json")]
    pub agents: PathBuf,

    /// Key-value memory store file.
    #[arg(long, default_value = "memory/memory.json")]
    pub memory: PathBuf,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Where to write the mission plan.
    #[arg(long, default_value = "missions/mission_001.json")]
    pub mission: PathBuf,

    /// Where to write the agent registry.
    #[arg(long, default_value = "agents_map.json")]
    pub agents: PathBuf,

    /// High-level goal for the scaffolded plan.
    #[arg(long, default_value = "Write and post a short update")]
    pub goal: String,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}
