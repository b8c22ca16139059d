//! Full analysis run: lower inputs to IR, run the engine, render findings.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use crossguard_ir::SourceLanguage;
use crossguard_scanners::{
    AnalysisConfig, AnalysisEngine, AnalysisMode, AnalysisReport, Severity,
};
use std::path::PathBuf;

#[derive(Args, Clone)]
pub struct AnalyzeArgs {
    /// Parse-tree file (*.json) or directory of parse trees
    #[arg(short, long)]
    pub input: PathBuf,

    /// Force a source language instead of sniffing the file name
    #[arg(long, value_enum)]
    pub language: Option<LanguageArg>,

    #[arg(long, value_enum, default_value_t = ModeArg::Standard)]
    pub mode: ModeArg,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Cyclomatic complexity above this is flagged
    #[arg(long, default_value_t = 15)]
    pub complexity_threshold: usize,

    /// Nesting depth above this is flagged
    #[arg(long, default_value_t = 6)]
    pub nesting_threshold: usize,

    /// Disable cross-module interface checks
    #[arg(long)]
    pub no_cross_language: bool,

    /// Run analyzers one function at a time instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Exit nonzero when a finding at or above this severity exists
    #[arg(long, value_enum)]
    pub fail_on: Option<SeverityArg>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    Solidity,
    Rust,
    Go,
}

impl From<LanguageArg> for SourceLanguage {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::Solidity => SourceLanguage::Solidity,
            LanguageArg::Rust => SourceLanguage::Rust,
            LanguageArg::Go => SourceLanguage::Go,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Fast,
    Standard,
    Deep,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Low => Severity::Low,
            SeverityArg::Medium => Severity::Medium,
            SeverityArg::High => Severity::High,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

pub fn execute(args: AnalyzeArgs) -> Result<()> {
    let files = super::collect_inputs(&args.input)?;
    if args.verbose {
        println!("Loading {} parse tree(s)...", files.len());
    }

    let builder = super::build_modules(&files, args.language.map(Into::into))?;
    let modules = builder.into_modules();

    let config = AnalysisConfig {
        mode: match args.mode {
            ModeArg::Fast => AnalysisMode::Fast,
            ModeArg::Standard => AnalysisMode::Standard,
            ModeArg::Deep => AnalysisMode::Deep,
        },
        complexity_threshold: args.complexity_threshold,
        nesting_threshold: args.nesting_threshold,
        cross_language: !args.no_cross_language,
        parallel: !args.sequential,
        ..AnalysisConfig::default()
    };

    let engine = AnalysisEngine::new(config)?;
    let report = engine.analyze_modules(&modules);

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Console => render_console(&report, args.verbose),
    }

    if let Some(threshold) = args.fail_on {
        let threshold: Severity = threshold.into();
        if report.findings.iter().any(|f| f.severity >= threshold) {
            anyhow::bail!("findings at or above {threshold} severity present");
        }
    }

    Ok(())
}

fn render_console(report: &AnalysisReport, verbose: bool) {
    println!("{}", "Crossguard Analysis Report".bright_blue().bold());
    println!("{}", "=".repeat(50).bright_blue());

    let stats = &report.statistics;
    println!(
        "Modules: {}   Contracts: {}   Functions: {}",
        stats.total_modules, stats.total_contracts, stats.total_functions
    );
    println!(
        "Findings: {} (critical {} / high {} / medium {} / low {} / info {})",
        stats.total_findings,
        stats.by_severity.critical,
        stats.by_severity.high,
        stats.by_severity.medium,
        stats.by_severity.low,
        stats.by_severity.info,
    );

    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    if report.is_empty() {
        println!("\n{}", "No issues found".bright_green().bold());
        return;
    }

    println!();
    for finding in &report.findings {
        let severity = format!("[{}]", finding.severity);
        let severity = match finding.severity {
            Severity::Critical | Severity::High => severity.bright_red().bold(),
            Severity::Medium => severity.yellow().bold(),
            Severity::Low => severity.bright_yellow(),
            Severity::Info => severity.blue(),
        };
        println!("{severity} {} at {}", finding.title.bold(), finding.location);
        println!("    {}", finding.description);
        if verbose {
            println!(
                "    analyzer: {}  category: {}  confidence: {:.0}%",
                finding.analyzer,
                finding.category,
                finding.confidence * 100.0
            );
            if let Some(recommendation) = &finding.recommendation {
                println!("    recommendation: {recommendation}");
            }
        }
    }
}
