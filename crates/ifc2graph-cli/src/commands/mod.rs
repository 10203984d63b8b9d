//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use ifc2graph_graph::{GraphConfig, Neo4jStore};
use ifc2graph_step::{IfcDocument, SchemaSource};

pub mod export;
pub mod generate;
pub mod status;
pub mod validate;

/// Upper bound on the initial Bolt handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Translate IFC models into labelled property graphs
#[derive(Parser)]
#[command(name = "ifc2graph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write log events to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the property graph of a model
    Generate(generate::GenerateArgs),

    /// Compare a generated graph against its model
    Validate(validate::ValidateArgs),

    /// Write an arrows.app layout of a model
    ExportArrows(export::ExportArgs),

    /// Show generated models and their node counts
    Status(status::StatusArgs),

    /// List the nodes one node points to
    Children(status::ChildrenArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => generate::execute(args).await,
            Commands::Validate(args) => validate::execute(args).await,
            Commands::ExportArrows(args) => export::execute(args),
            Commands::Status(args) => status::execute(args).await,
            Commands::Children(args) => status::children(args).await,
        }
    }
}

/// Where to read the model and its schema from.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// IFC (P21) model file
    #[arg(env = "IFC_PATH")]
    pub input: PathBuf,

    /// EXPRESS schema file; overrides the lookup in --schema-dir
    #[arg(long, env = "IFC_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Directory holding `<FILE_SCHEMA>.exp` files
    #[arg(long, env = "IFC_SCHEMA_DIR", default_value = "schemas")]
    pub schema_dir: PathBuf,
}

impl ModelArgs {
    pub fn schema_source(&self) -> SchemaSource {
        match &self.schema {
            Some(file) => SchemaSource::File(file.clone()),
            None => SchemaSource::Directory(self.schema_dir.clone()),
        }
    }

    pub fn open(&self) -> Result<IfcDocument> {
        IfcDocument::open(&self.input, &self.schema_source())
            .with_context(|| format!("Failed to open {}", self.input.display()))
    }
}

/// Neo4j connection settings; unset values fall back to the defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct Neo4jArgs {
    /// Bolt URI
    #[arg(long = "neo4j-uri", env = "NEO4J_URI")]
    pub uri: Option<String>,

    #[arg(long = "neo4j-user", env = "NEO4J_USER")]
    pub user: Option<String>,

    #[arg(long = "neo4j-password", env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long = "neo4j-database", env = "NEO4J_DATABASE")]
    pub database: Option<String>,
}

impl Neo4jArgs {
    pub fn config(&self) -> GraphConfig {
        let defaults = GraphConfig::default();
        GraphConfig {
            uri: self.uri.clone().unwrap_or(defaults.uri),
            user: self.user.clone().unwrap_or(defaults.user),
            password: self.password.clone().unwrap_or(defaults.password),
            database: self.database.clone().unwrap_or(defaults.database),
        }
    }

    pub async fn connect(&self) -> Result<Neo4jStore> {
        let config = self.config();
        let store = tokio::time::timeout(CONNECT_TIMEOUT, Neo4jStore::connect(&config))
            .await
            .with_context(|| format!("Timed out connecting to Neo4j at {}", config.uri))??;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_neo4j_args_fall_back_to_defaults() {
        let args = Neo4jArgs {
            database: Some("models".into()),
            ..Default::default()
        };
        let config = args.config();
        assert_eq!(config.database, "models");
        assert_eq!(config.uri, GraphConfig::default().uri);
    }

    #[test]
    fn test_schema_source_prefers_file() {
        let args = ModelArgs {
            input: "wall.ifc".into(),
            schema: Some("IFC4.exp".into()),
            schema_dir: "schemas".into(),
        };
        assert!(matches!(args.schema_source(), SchemaSource::File(path) if path == PathBuf::from("IFC4.exp")));

        let args = ModelArgs { schema: None, ..args };
        assert!(matches!(args.schema_source(), SchemaSource::Directory(path) if path == PathBuf::from("schemas")));
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "ifc2graph",
            "generate",
            "model.ifc",
            "--dry-run",
            "--write-log",
            "out.cypher",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert!(args.dry_run);
                assert_eq!(args.model.input, PathBuf::from("model.ifc"));
                assert_eq!(args.write_log, Some(PathBuf::from("out.cypher")));
            }
            _ => panic!("expected generate"),
        }
    }
}
