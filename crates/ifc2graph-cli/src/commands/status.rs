//! `status` and `children`: read-only views of generated models.

use anyhow::Result;
use clap::Args;

use ifc2graph_core::ModelLabel;
use ifc2graph_graph::queries;

use super::Neo4jArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub neo4j: Neo4jArgs,

    /// Show role and edge counts for this label only
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug)]
pub struct ChildrenArgs {
    #[command(flatten)]
    pub neo4j: Neo4jArgs,

    /// Model label, e.g. ts20220504T080830
    #[arg(long)]
    pub label: String,

    /// Source entity id of the parent node
    pub p21_id: u64,
}

pub async fn execute(args: StatusArgs) -> Result<()> {
    let store = args.neo4j.connect().await?;
    let client = store.client();

    match &args.label {
        Some(label) => {
            let counts = queries::role_counts(client, &ModelLabel::new(label.clone())).await?;
            output::print_role_counts(label, &counts);
        }
        None => {
            let models = queries::list_models(client).await?;
            output::print_models(&models);
            let totals = client.get_counts().await?;
            output::print_totals(&totals);
        }
    }
    Ok(())
}

pub async fn children(args: ChildrenArgs) -> Result<()> {
    let store = args.neo4j.connect().await?;
    let label = ModelLabel::new(args.label.clone());

    let children = queries::child_nodes(store.client(), &label, args.p21_id).await?;
    output::print_children(args.p21_id, &children);
    Ok(())
}
