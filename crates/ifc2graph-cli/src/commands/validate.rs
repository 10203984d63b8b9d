//! `validate`: compare a stored graph against the model it came from.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use ifc2graph_core::{validate, ModelDocument, ModelLabel};

use super::{ModelArgs, Neo4jArgs};
use crate::output;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub neo4j: Neo4jArgs,

    /// Check this label instead of the one derived from the model header
    #[arg(long)]
    pub label: Option<String>,

    /// Exit with an error when the counts differ
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let document = args.model.open()?;
    let label = match &args.label {
        Some(label) => ModelLabel::new(label.clone()),
        None => ModelLabel::from_time_stamp(document.time_stamp()),
    };

    let store = args.neo4j.connect().await?;

    println!("{} {}", "Validating".bold(), label.as_str().cyan());
    println!("{}", "─".repeat(50));
    let report = validate(&document, &store, &label).await?;
    output::print_validation(&report);

    if args.strict && !report.passed() {
        anyhow::bail!(
            "{} holds {} nodes for {} entities",
            report.label,
            report.node_count,
            report.entity_count
        );
    }
    Ok(())
}
