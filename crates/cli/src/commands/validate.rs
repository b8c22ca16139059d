//! Pre-flight validation: configuration plus built-IR consistency.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use crossguard_scanners::AnalysisConfig;
use std::path::PathBuf;

use super::analyze::LanguageArg;

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Parse-tree file (*.json) or directory of parse trees
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub language: Option<LanguageArg>,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("{}", "Validating IR".bright_cyan().bold());
    println!("{}", "=".repeat(50).bright_cyan());

    let config_errors = AnalysisConfig::default().validate();
    for error in &config_errors {
        println!("{} {error}", "config:".yellow().bold());
    }

    let files = super::collect_inputs(&args.input)?;
    let builder = super::build_modules(&files, args.language.map(Into::into))?;
    let ir_errors = builder.validate();
    for error in &ir_errors {
        println!("{} {error}", "ir:".yellow().bold());
    }

    if config_errors.is_empty() && ir_errors.is_empty() {
        println!("{}", "VALID".bright_green().bold());
        Ok(())
    } else {
        println!("{}", "INVALID".bright_red().bold());
        anyhow::bail!(
            "validation failed with {} issue(s)",
            config_errors.len() + ir_errors.len()
        )
    }
}
