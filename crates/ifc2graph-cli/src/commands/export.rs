//! `export-arrows`: write an arrows.app layout next to the model.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use ifc2graph_core::export::{default_output_path, export_arrows, ArrowsOptions};

use super::ModelArgs;

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output file; defaults to `<model>_arrowsVis.json` beside the model
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep null attributes as JSON nulls
    #[arg(long)]
    pub keep_nulls: bool,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let document = args.model.open()?;
    let arrows = export_arrows(
        &document,
        ArrowsOptions {
            ignore_null_values: !args.keep_nulls,
        },
    )?;

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.model.input));
    arrows
        .write_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} nodes, {} relationships to {}",
        "Exported".green().bold(),
        arrows.nodes.len(),
        arrows.relationships.len(),
        path.display().to_string().cyan()
    );
    Ok(())
}
