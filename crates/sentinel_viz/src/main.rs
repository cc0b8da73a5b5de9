//! Sentinel Viz - explained graph server and story CLI.

use clap::{Parser, Subcommand};
use sentinel_story::{Story, StoryConfig};
use sentinel_viz::store::{DEFAULT_EXPLANATION_DIR, DEFAULT_GRAPH_DIR};
use sentinel_viz::{ArtifactStore, BackendClient, ClientConfig, Result, VizConfig, VizServer};
use std::path::PathBuf;

/// Sentinel explained-graph explorer
#[derive(Parser, Debug)]
#[command(name = "sentinel-viz")]
#[command(version)]
#[command(about = "Serve explained event graphs and tell their story", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve graphs, explanations, stories and the web UI
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Directory holding window_NNNN.json graph documents
        #[arg(long, default_value = DEFAULT_GRAPH_DIR)]
        graphs: PathBuf,

        /// Directory holding explanation_N.json documents
        #[arg(long, default_value = DEFAULT_EXPLANATION_DIR)]
        explanations: PathBuf,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,
    },

    /// Print the story of one sequence from a running backend
    Story {
        /// Sequence id
        id: u64,

        /// Backend base URL
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        backend: String,

        /// Render timeline times in UTC
        #[arg(long)]
        utc: bool,

        /// Print the story as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Serve {
            host,
            port,
            graphs,
            explanations,
            no_cors,
        } => {
            let config = VizConfig {
                host,
                port,
                enable_cors: !no_cors,
                enable_tracing: cli.verbose > 0,
            };
            log::info!(
                "Reading graphs from {} and explanations from {}",
                graphs.display(),
                explanations.display()
            );
            let server = VizServer::new(config, ArtifactStore::new(graphs, explanations));

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                log::info!("Shutdown signal received");
            };

            server.start_with_shutdown(shutdown).await
        }
        Commands::Story {
            id,
            backend,
            utc,
            json,
        } => {
            let client = BackendClient::new(ClientConfig::with_base_url(backend))?;
            let config = if utc {
                StoryConfig::utc()
            } else {
                StoryConfig::default()
            };
            let story = client.load_story(id, &config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&story)?);
            } else {
                print_story(id, &story);
            }
            Ok(())
        }
    }
}

fn print_story(id: u64, story: &Story) {
    println!("Sequence {}: {}", id, story.prediction);
    println!("Temporal attention: {}", story.temporal_summary);

    println!("Top nodes:");
    for (rank, top) in story.top_nodes.iter().enumerate() {
        println!(
            "  {}. {} ({}) {:.2}%",
            rank + 1,
            top.node.as_deref().unwrap_or("?"),
            top.node_type.as_deref().unwrap_or("?"),
            top.score * 100.0
        );
    }

    println!("Timeline:");
    for line in &story.timeline {
        println!("  {}", line);
    }
    if story.skipped_events > 0 {
        println!("  ({} events with unreadable timestamps)", story.skipped_events);
    }
}
