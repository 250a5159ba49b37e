//! sesh CLI: Wikibase ↔ RDF ontology synchronization.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use sesh_sync::config::SyncConfig;
use sesh_sync::hosting::GithubClient;
use sesh_sync::rdf::{self, RdfSyntax};
use sesh_sync::reconcile::Reconciler;
use sesh_sync::remote::WikibaseClient;

#[derive(Parser)]
#[command(name = "sesh", version, about = "Wikibase to RDF ontology synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize entities into a local graph file.
    Sync {
        /// Wikibase action API endpoint (…/api.php).
        #[arg(long)]
        endpoint: String,

        /// Local RDF graph file.
        #[arg(long)]
        graph: PathBuf,

        /// Entity ids to reconcile (e.g. Q5, P11). When omitted, the
        /// recent-changes feed decides.
        #[arg(long = "id")]
        ids: Vec<String>,

        /// Recent-changes window in days (used when no ids are given).
        #[arg(long, default_value = "100")]
        days: u32,

        /// Syntax of the graph file.
        #[arg(long, default_value = "ttl")]
        syntax: String,

        /// Where to write the result; defaults to the input file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the entities changed in the last days.
    Changed {
        /// Wikibase action API endpoint (…/api.php).
        #[arg(long)]
        endpoint: String,

        /// Recent-changes window in days.
        #[arg(long, default_value = "100")]
        days: u32,
    },

    /// Re-serialize a graph file in another syntax.
    Convert {
        /// Input graph file.
        #[arg(long)]
        input: PathBuf,

        /// Syntax of the input file.
        #[arg(long, default_value = "ttl")]
        from: String,

        /// Target syntax.
        #[arg(long)]
        to: String,

        /// Where to write the result.
        #[arg(long)]
        output: PathBuf,
    },

    /// Open a pull request with a synchronized graph file.
    Push {
        /// TOML config file with a [hosting] section.
        #[arg(long)]
        config: PathBuf,

        /// The graph file to publish.
        #[arg(long)]
        graph: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync {
            endpoint,
            graph,
            ids,
            days,
            syntax,
            output,
        } => {
            let syntax = RdfSyntax::from_name(&syntax)?;
            let text = std::fs::read_to_string(&graph).into_diagnostic()?;
            let mut local = rdf::parse_graph(&text, syntax)?;

            let engine = Reconciler::new(WikibaseClient::new(endpoint));
            let ids = if ids.is_empty() {
                engine
                    .client()
                    .changed_entities(days)?
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect()
            } else {
                ids
            };
            for id in &ids {
                engine.execute(&mut local, id)?;
            }

            let serialized = rdf::serialize_graph(&local, syntax)?;
            let target = output.unwrap_or(graph);
            std::fs::write(&target, serialized).into_diagnostic()?;
            println!("synchronized {} entities into {}", ids.len(), target.display());
        }

        Commands::Changed { endpoint, days } => {
            let client = WikibaseClient::new(endpoint);
            for id in client.changed_entities(days)? {
                println!("{id}");
            }
        }

        Commands::Convert {
            input,
            from,
            to,
            output,
        } => {
            let from = RdfSyntax::from_name(&from)?;
            let to = RdfSyntax::from_name(&to)?;
            let text = std::fs::read_to_string(&input).into_diagnostic()?;
            let graph = rdf::parse_graph(&text, from)?;
            std::fs::write(&output, rdf::serialize_graph(&graph, to)?).into_diagnostic()?;
            println!("wrote {} as {to}", output.display());
        }

        Commands::Push { config, graph } => {
            let config = SyncConfig::load(&config)?;
            let hosting = config
                .hosting
                .as_ref()
                .ok_or_else(|| miette::miette!("the config file has no [hosting] section"))?;
            let content = std::fs::read_to_string(&graph).into_diagnostic()?;
            let client = GithubClient::new(hosting.token()?);
            let pull_request = client.publish(hosting, &content)?;
            println!("opened pull request #{}: {}", pull_request.number, pull_request.url);
        }
    }
    Ok(())
}
