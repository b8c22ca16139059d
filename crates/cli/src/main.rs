use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::{analyze::AnalyzeArgs, stats::StatsArgs, validate::ValidateArgs};

#[derive(Parser)]
#[command(name = "crossguard")]
#[command(about = "Multi-language smart contract static analysis over a unified IR")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analyzer suite and report findings
    Analyze(AnalyzeArgs),

    /// Print IR and control-flow statistics
    Stats(StatsArgs),

    /// Validate configuration and built IR without analyzing
    Validate(ValidateArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args),
        Commands::Stats(args) => commands::stats::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
