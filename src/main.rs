//! Brand Graph - Main Server
//!
//! Serves the aggregated brand/topic graph from Neo4j over HTTP.

use anyhow::Result;
use brandgraph::{graph::GraphMode, service::GraphService, AppState, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "brandgraph")]
#[command(about = "Brand / topic intelligence graph server")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check the Neo4j connection
    Ping,

    /// Print the aggregated graph as JSON
    Dump {
        /// enriched | ranked | generic
        #[arg(short, long)]
        mode: Option<GraphMode>,

        /// Topic limit for the ranked mode
        #[arg(short = 'n', long)]
        top_n: Option<usize>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,brandgraph=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            brandgraph::start_server(config).await
        }
        Commands::Ping => run_ping(config).await,
        Commands::Dump {
            mode,
            top_n,
            pretty,
        } => run_dump(config, mode, top_n, pretty).await,
    }
}

async fn run_ping(config: Config) -> Result<()> {
    let state = AppState::new(config).await?;
    let store = state.graph.store();

    let message = store.ping().await?;
    let nodes = store.count_nodes().await?;
    println!("{} ({} nodes)", message, nodes);
    Ok(())
}

async fn run_dump(
    config: Config,
    mode: Option<GraphMode>,
    top_n: Option<usize>,
    pretty: bool,
) -> Result<()> {
    let state = AppState::new(config).await?;
    let service: &GraphService = &state.graph;

    let graph = service.graph(mode, top_n).await?;
    let json = if pretty {
        serde_json::to_string_pretty(graph.as_ref())?
    } else {
        serde_json::to_string(graph.as_ref())?
    };
    println!("{}", json);

    tracing::info!(
        "Dumped {} nodes and {} links",
        graph.nodes.len(),
        graph.links.len()
    );
    Ok(())
}
