//! `generate`: run both passes against Neo4j or, with `--dry-run`, memory.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use ifc2graph_core::{GenerationReport, GraphGenerator, GraphStore, MemoryStore, ModelDocument, ModelLabel};
use ifc2graph_graph::schema::initialize_schema;

use super::{ModelArgs, Neo4jArgs};
use crate::output::{self, StageBars};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub neo4j: Neo4jArgs,

    /// Generate into memory only; nothing is written to Neo4j
    #[arg(long)]
    pub dry_run: bool,

    /// Compare node and entity counts afterwards
    #[arg(long)]
    pub validate: bool,

    /// Save every issued write as a Cypher script
    #[arg(long)]
    pub write_log: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Hide progress bars
    #[arg(long)]
    pub quiet: bool,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    let document = args.model.open()?;
    if !args.json {
        println!(
            "{} {} ({} entities)",
            "Generating".bold(),
            args.model.input.display().to_string().cyan(),
            document.entity_count()
        );
    }

    let report = if args.dry_run {
        let store = MemoryStore::new();
        run(&document, &store, &args).await?
    } else {
        let store = args.neo4j.connect().await?;
        let label = ModelLabel::from_time_stamp(document.time_stamp());
        initialize_schema(store.client(), &label).await?;
        run(&document, &store, &args).await?
    };

    if let Some(path) = &args.write_log {
        write_script(path, &report)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_generation_report(&report, args.dry_run);
        if let Some(path) = &args.write_log {
            println!("Write log saved to {}", path.display().to_string().cyan());
        }
    }
    Ok(())
}

async fn run<S>(document: &dyn ModelDocument, store: &S, args: &GenerateArgs) -> Result<GenerationReport>
where
    S: GraphStore,
{
    let bars = StageBars::new();
    let mut generator = GraphGenerator::new(document, store);
    if !args.quiet && !args.json {
        generator = generator.with_progress(&bars);
    }

    generator
        .generate(args.validate)
        .await
        .with_context(|| format!("Failed to generate graph for {}", args.model.input.display()))
}

fn write_script(path: &Path, report: &GenerationReport) -> Result<()> {
    let mut script = format!(
        "// ifc2graph write log for {} ({})\n",
        report.label,
        chrono::Local::now().to_rfc3339()
    );
    script.push_str(&report.log.to_cypher_script());
    std::fs::write(path, script).with_context(|| format!("Failed to write {}", path.display()))
}
