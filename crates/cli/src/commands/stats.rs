//! IR and control-flow statistics without running any analyzers.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::analyze::LanguageArg;

#[derive(Args, Clone)]
pub struct StatsArgs {
    /// Parse-tree file (*.json) or directory of parse trees
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub language: Option<LanguageArg>,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let files = super::collect_inputs(&args.input)?;
    let builder = super::build_modules(&files, args.language.map(Into::into))?;

    let stats = builder.statistics();
    println!("{}", "IR Statistics".bright_cyan().bold());
    println!("{}", "=".repeat(50).bright_cyan());
    println!("Modules:   {}", stats.modules);
    println!("Contracts: {}", stats.contracts);
    println!("Functions: {}", stats.functions);
    println!("Variables: {}", stats.variables);
    println!(
        "Languages: {}",
        stats
            .languages
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );

    let cfg_stats = builder.cfg_statistics();
    if !cfg_stats.is_empty() {
        println!("\n{}", "Control Flow Graphs".bright_cyan().bold());
        for (function, stats) in &cfg_stats {
            println!(
                "  {function}: {} blocks, {} edges, complexity {}",
                stats.nodes, stats.edges, stats.complexity
            );
        }
    }

    Ok(())
}
