//! Command implementations for the Crossguard CLI.
//!
//! `analyze` runs the full analyzer suite and renders a report, `stats`
//! prints IR and control-flow statistics, and `validate` checks both the
//! analysis configuration and the consistency of the built IR without
//! running any analyzers.

pub mod analyze;
pub mod stats;
pub mod validate;

use anyhow::{Context, Result};
use crossguard_ir::{IrBuilder, SourceLanguage};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects parse-tree files (`*.json`) under `input`, which may be a single
/// file or a directory.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no parse-tree files (*.json) found under {}", input.display());
    }
    tracing::debug!(count = files.len(), root = %input.display(), "collected parse trees");
    Ok(files)
}

/// The source language for one parse-tree file: `Token.sol.json` is the AST
/// of `Token.sol`, so the language is sniffed from the inner extension.
pub fn language_of(path: &Path, override_language: Option<SourceLanguage>) -> SourceLanguage {
    if let Some(language) = override_language {
        return language;
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    SourceLanguage::from_path(stem).unwrap_or(SourceLanguage::Solidity)
}

/// Loads every input file and lowers it into the builder.
pub fn build_modules(
    files: &[PathBuf],
    override_language: Option<SourceLanguage>,
) -> Result<IrBuilder> {
    let mut builder = IrBuilder::new();
    for path in files {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let tree: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {} as JSON", path.display()))?;
        let language = language_of(path, override_language);
        // The module is named after the source file, not its AST dump.
        let module_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        builder.build_from(language, &tree, &module_name);
    }
    Ok(builder)
}
